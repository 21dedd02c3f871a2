use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batch processing configuration for the synchronizer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Maximum number of change records accepted per invocation.
    ///
    /// Larger batches are still processed, but a warning is emitted since the
    /// source log is expected to respect this bound.
    #[serde(default = "default_batch_max_size")]
    pub max_size: usize,
    /// Overall deadline for a single batch invocation, in milliseconds.
    ///
    /// When the deadline is reached, the in-flight operation completes but no
    /// new event is started; the partial outcome is returned to the caller.
    /// `0` disables the deadline.
    #[serde(default = "default_batch_deadline_ms")]
    pub deadline_ms: u64,
}

impl BatchConfig {
    /// Default maximum batch size.
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    /// Default batch deadline in milliseconds (30 seconds).
    pub const DEFAULT_DEADLINE_MS: u64 = 30_000;

    /// Validates batch configuration settings.
    ///
    /// Ensures max_size is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: default_batch_max_size(),
            deadline_ms: default_batch_deadline_ms(),
        }
    }
}

fn default_batch_max_size() -> usize {
    BatchConfig::DEFAULT_MAX_SIZE
}

fn default_batch_deadline_ms() -> u64 {
    BatchConfig::DEFAULT_DEADLINE_MS
}
