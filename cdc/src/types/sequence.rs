use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, ordered marker taken from the source change log.
///
/// Sequence tokens are the log's native sequence numbers: unbounded decimal
/// strings that grow monotonically per key. Tokens are canonicalized at
/// construction by stripping leading zeros, so ordering reduces to comparing
/// lengths first and digits second.
///
/// The ordering guard uses these tokens to discard stale redeliveries: for a
/// fixed `(source_entity, key)`, an event whose token is strictly smaller
/// than the last applied one must not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceToken(String);

impl SequenceToken {
    /// Creates a token from the source log's sequence number.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim_start_matches('0');

        if trimmed.is_empty() {
            return Self("0".to_string());
        }

        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the canonical token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for SequenceToken {
    fn cmp(&self, other: &Self) -> Ordering {
        // Canonical tokens have no leading zeros, so a longer decimal string
        // is always the larger number.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SequenceToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for SequenceToken {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}
