//! Error types and result definitions for synchronizer operations.
//!
//! Provides an error system with classification, aggregation, and captured
//! diagnostic metadata. The [`CdcError`] type supports single errors, errors
//! with additional detail, and multiple aggregated errors.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for synchronizer operations using [`CdcError`] as the error type.
pub type CdcResult<T> = Result<T, CdcError>;

/// Detailed payload stored for single [`CdcError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for synchronizer operations.
///
/// [`CdcError`] can represent single errors, errors with additional detail,
/// or multiple aggregated errors, while keeping the callsite location and a
/// backtrace for diagnostics.
#[derive(Debug, Clone)]
pub struct CdcError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors.
    Many {
        errors: Vec<CdcError>,
        location: &'static Location<'static>,
    },
}

/// Specific categories of errors that can occur during synchronization.
///
/// The classification drives retry behavior: connectivity-class kinds make a
/// whole batch retryable, data-class kinds stay confined to a single event.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection errors
    ConnectionFailed,

    // Query & execution errors
    QueryFailed,
    ConstraintViolation,

    // Data & transformation errors
    MalformedRecord,
    MappingFailed,
    ConversionError,
    InvalidData,

    // IO & serialization errors
    IoError,
    SerializationError,
    DeserializationError,

    // Configuration errors
    ConfigError,

    // State errors
    InvalidState,

    // Unknown / uncategorized
    Unknown,
}

impl ErrorKind {
    /// Returns `true` for connectivity-class errors.
    ///
    /// A retryable error means the whole batch should be redelivered: the
    /// failure is not specific to a row, and the same operation is expected
    /// to succeed once the target store is reachable again. Data and
    /// constraint failures are not retryable since redelivery would fail
    /// identically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ConnectionFailed | ErrorKind::IoError)
    }
}

impl CdcError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or
    /// [`ErrorKind::Unknown`] if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect when called on aggregated errors because aggregates
    /// forward the first contained error as their source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    /// Creates a [`CdcError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        let location = Location::caller();
        let backtrace = Arc::new(Backtrace::capture());

        CdcError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location,
                backtrace,
            }),
        }
    }
}

impl PartialEq for CdcError {
    fn eq(&self, other: &CdcError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl Hash for CdcError {
    /// Hashes the error using only its stable identifying components.
    ///
    /// Location, detail, source, and backtrace are intentionally excluded so
    /// that errors of the same category produce the same hash, enabling
    /// stable grouping and deduplication across occurrences.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                std::mem::discriminant(&self.repr).hash(state);
                payload.kind.hash(state);
                payload.description.hash(state);
            }
            ErrorRepr::Many { errors, .. } => {
                std::mem::discriminant(&self.repr).hash(state);
                errors.len().hash(state);
                for error in errors {
                    error.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for CdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail: {detail}")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for CdcError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            // For aggregated errors, we forward the first contained error as the source.
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`CdcError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for CdcError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> CdcError {
        CdcError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`CdcError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for CdcError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> CdcError {
        CdcError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Creates a [`CdcError`] from a vector of errors for aggregation.
///
/// If the vector contains exactly one error, returns that error directly
/// without wrapping it.
impl<E> From<Vec<E>> for CdcError
where
    E: Into<CdcError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> CdcError {
        let location = Location::caller();

        let mut errors: Vec<CdcError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        CdcError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`CdcError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for CdcError {
    #[track_caller]
    fn from(err: std::io::Error) -> CdcError {
        let detail = err.to_string();
        let source = Arc::new(err);
        CdcError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`serde_json::Error`] to [`CdcError`] with the appropriate error kind.
impl From<serde_json::Error> for CdcError {
    #[track_caller]
    fn from(err: serde_json::Error) -> CdcError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        let source = Arc::new(err);
        CdcError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`chrono::ParseError`] to [`CdcError`] with [`ErrorKind::ConversionError`].
impl From<chrono::ParseError> for CdcError {
    #[track_caller]
    fn from(err: chrono::ParseError) -> CdcError {
        let detail = err.to_string();
        let source = Arc::new(err);
        CdcError::from_components(
            ErrorKind::ConversionError,
            Cow::Borrowed("Datetime parsing failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`uuid::Error`] to [`CdcError`] with [`ErrorKind::InvalidData`].
impl From<uuid::Error> for CdcError {
    #[track_caller]
    fn from(err: uuid::Error) -> CdcError {
        let detail = err.to_string();
        let source = Arc::new(err);
        CdcError::from_components(
            ErrorKind::InvalidData,
            Cow::Borrowed("UUID parsing failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`sqlx::Error`] to [`CdcError`] with the appropriate error kind.
///
/// SQLSTATE class `23` (integrity constraint violations) maps to
/// [`ErrorKind::ConstraintViolation`], class `08` and pool exhaustion map to
/// [`ErrorKind::ConnectionFailed`], and everything else maps to
/// [`ErrorKind::QueryFailed`]. This split is what keeps a foreign-key
/// violation confined to one event while a dropped connection fails the
/// whole batch as retryable.
impl From<sqlx::Error> for CdcError {
    #[track_caller]
    fn from(err: sqlx::Error) -> CdcError {
        let (kind, description) = match &err {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(code) if code.starts_with("23") => (
                    ErrorKind::ConstraintViolation,
                    "target store constraint violation",
                ),
                Some(code) if code.starts_with("08") => {
                    (ErrorKind::ConnectionFailed, "target store connection failed")
                }
                _ => (ErrorKind::QueryFailed, "target store query failed"),
            },
            sqlx::Error::Io(_) => (ErrorKind::IoError, "target store I/O failed"),
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                (ErrorKind::ConnectionFailed, "target store connection failed")
            }
            _ => (ErrorKind::QueryFailed, "target store operation failed"),
        };

        let detail = err.to_string();
        let source = Arc::new(err);
        CdcError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}
