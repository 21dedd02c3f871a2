//! Shared configuration types for the CDC synchronizer.

mod base;
mod batch;
mod connection;
mod reconnection;
mod synchronizer;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use connection::{PgConnectionConfig, TlsConfig};
pub use reconnection::ReconnectionConfig;
pub use synchronizer::{SynchronizerConfig, SynchronizerId};
