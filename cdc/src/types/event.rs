use std::collections::BTreeMap;
use std::fmt;

use crate::types::SequenceToken;

/// The kind of change described by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A new row was created in the source store.
    Create,
    /// An existing row was updated.
    Update,
    /// A row was removed.
    Delete,
    /// The raw record could not be normalized.
    ///
    /// Malformed records are carried through the batch as events so the
    /// processor can report a per-event failure instead of aborting.
    Malformed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
            ChangeKind::Malformed => "malformed",
        };
        f.write_str(name)
    }
}

/// Canonical unit of work produced by the normalizer.
///
/// A [`ChangeEvent`] carries everything the router, mappers, and executor
/// need: the originating entity, the change kind, the ordered source key,
/// the full post-change image (absent for deletes), and the source log's
/// sequence token used by the ordering guard.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Identifier of the originating table/collection, e.g. `profiles`.
    pub source_entity: String,
    /// The kind of change.
    pub kind: ChangeKind,
    /// Ordered mapping from source key-attribute name to value.
    pub key: BTreeMap<String, serde_json::Value>,
    /// Full post-change attribute mapping; absent for deletes.
    pub after: Option<serde_json::Map<String, serde_json::Value>>,
    /// Monotonically non-decreasing marker from the source log.
    pub sequence: SequenceToken,
    /// Reason the record failed normalization, set only for
    /// [`ChangeKind::Malformed`].
    pub malformed_reason: Option<String>,
}

impl ChangeEvent {
    /// Returns a stable string form of the source key.
    ///
    /// The key map is ordered, so the canonical form is deterministic for a
    /// given source row and usable as a guard-map key.
    pub fn canonical_key(&self) -> String {
        let mut canonical = String::new();
        for (index, (name, value)) in self.key.iter().enumerate() {
            if index > 0 {
                canonical.push('\u{1f}');
            }
            canonical.push_str(name);
            canonical.push('=');
            canonical.push_str(&value.to_string());
        }
        canonical
    }
}
