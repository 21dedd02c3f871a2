//! Tracing initialization for synchronizer binaries.
//!
//! Installs the global tracing subscriber with environment-driven filtering.
//! Production output is JSON through a non-blocking writer; development
//! output is human-readable ANSI. The returned [`LogFlusher`] must be held
//! for the lifetime of the process so buffered log lines are flushed on
//! shutdown.

use config::environment::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Default filter directive applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to determine the runtime environment.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] std::io::Error),

    /// The `log` crate bridge could not be installed.
    #[error("failed to install log tracer: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Guard that flushes buffered log output when dropped.
///
/// Binaries should keep this alive in `main` until the process exits.
#[must_use = "dropping the flusher stops log output from being flushed"]
pub struct LogFlusher {
    _guard: Option<WorkerGuard>,
}

/// Initializes the global tracing subscriber for the given service.
///
/// The filter is taken from `RUST_LOG` with an `info` default. In prod the
/// subscriber emits JSON lines through a non-blocking stdout writer; in dev
/// it emits pretty ANSI output directly.
pub fn init_tracing(service_name: &str) -> Result<LogFlusher, TelemetryError> {
    let environment = Environment::load()?;

    // Route `log` macros from dependencies through tracing.
    LogTracer::init()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (layer, guard) = match environment {
        Environment::Prod => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_target(true)
                .with_writer(writer)
                .boxed();

            (layer, Some(guard))
        }
        Environment::Dev => {
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .boxed();

            (layer, None)
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()?;

    tracing::info!(service = service_name, environment = %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}
