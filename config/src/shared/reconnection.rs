use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for target store connection establishment retries.
///
/// Controls how the connection manager backs off between attempts when
/// establishing a connection to the relational target store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconnectionConfig {
    /// Maximum number of establishment attempts before the invocation fails.
    ///
    /// Default: 3
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before the second establishment attempt.
    ///
    /// Specified in milliseconds for serialization compatibility.
    /// Default: 200ms
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    /// Maximum delay between establishment attempts.
    ///
    /// The backoff algorithm will not exceed this delay.
    /// Default: 5000ms (5 seconds)
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Multiplier for exponential backoff between attempts.
    ///
    /// Must be >= 1.0. Default: 2.0
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    200
}

fn default_max_retry_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl ReconnectionConfig {
    /// Returns the initial retry delay as a [`Duration`].
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    /// Returns the maximum retry delay as a [`Duration`].
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    /// Validates reconnection configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "reconnection.max_attempts".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.backoff_multiplier < 1.0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "reconnection.backoff_multiplier".to_string(),
                constraint: "must be at least 1.0".to_string(),
            });
        }

        Ok(())
    }
}
