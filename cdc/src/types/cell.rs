use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CdcResult;

/// Typed column value for the relational target store.
///
/// Mappers convert the source document's attribute values into [`Cell`]s so
/// the executor can bind them with the correct database types. Nested
/// structures that have no scalar representation are carried as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Cell {
    /// Converts a source document attribute into a cell.
    ///
    /// Scalars map directly; arrays and objects are kept as JSON. Strings are
    /// not sniffed for timestamps or UUIDs, mappers request typed parses
    /// explicitly via [`Cell::timestamp_from_rfc3339`] and
    /// [`Cell::uuid_from_str`].
    pub fn from_json(value: &serde_json::Value) -> Cell {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(value) => Cell::Bool(*value),
            serde_json::Value::Number(value) => match value.as_i64() {
                Some(value) => Cell::I64(value),
                None => Cell::F64(value.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => Cell::String(value.clone()),
            value => Cell::Json(value.clone()),
        }
    }

    /// Parses an RFC 3339 timestamp string into a [`Cell::Timestamp`].
    pub fn timestamp_from_rfc3339(value: &str) -> CdcResult<Cell> {
        let timestamp = DateTime::parse_from_rfc3339(value)?;
        Ok(Cell::Timestamp(timestamp.with_timezone(&Utc)))
    }

    /// Parses a UUID string into a [`Cell::Uuid`].
    pub fn uuid_from_str(value: &str) -> CdcResult<Cell> {
        let uuid = Uuid::parse_str(value)?;
        Ok(Cell::Uuid(uuid))
    }

    /// Returns `true` when the cell holds no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::I64(value) => write!(f, "{value}"),
            Cell::F64(value) => write!(f, "{value}"),
            Cell::String(value) => f.write_str(value),
            Cell::Timestamp(value) => write!(f, "{}", value.to_rfc3339()),
            Cell::Uuid(value) => write!(f, "{value}"),
            Cell::Json(value) => write!(f, "{value}"),
        }
    }
}
