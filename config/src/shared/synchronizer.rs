use serde::Deserialize;

use crate::Config;
use crate::shared::{BatchConfig, PgConnectionConfig, ReconnectionConfig, ValidationError};

/// Identifier of a synchronizer deployment.
pub type SynchronizerId = u64;

/// Top-level configuration for a synchronizer process.
#[derive(Debug, Clone, Deserialize)]
pub struct SynchronizerConfig {
    /// Unique identifier of this synchronizer deployment.
    pub id: SynchronizerId,
    /// Connection settings for the relational target store.
    pub target: PgConnectionConfig,
    /// Batch processing settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Connection establishment retry settings.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,
}

impl SynchronizerConfig {
    /// Validates all nested configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.target.validate()?;
        self.batch.validate()?;
        self.reconnection.validate()?;

        Ok(())
    }
}

impl Config for SynchronizerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
