use std::fmt;

use crate::types::Cell;

/// The relational-side effect of a [`crate::types::ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Insert-or-replace keyed by the target key.
    Upsert,
    /// Delete keyed by the target key; deleting an absent row is not an error.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Upsert => f.write_str("upsert"),
            OperationKind::Delete => f.write_str("delete"),
        }
    }
}

/// A single operation against the relational target store, derived from a
/// change event by a mapper.
///
/// The target key is a pure function of the source key, so repeated mapping
/// of the same source row always addresses the same target row. Applying the
/// same operation twice leaves the target identical to applying it once.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetOperation {
    /// Target table name.
    pub table: &'static str,
    /// Target primary key columns, derived deterministically from the source key.
    pub key: Vec<(String, Cell)>,
    /// Column values for upserts; empty for deletes.
    pub columns: Vec<(String, Cell)>,
    /// Whether this is an upsert or a delete.
    pub kind: OperationKind,
}

impl TargetOperation {
    /// Builds an upsert operation.
    pub fn upsert(
        table: &'static str,
        key: Vec<(String, Cell)>,
        columns: Vec<(String, Cell)>,
    ) -> Self {
        Self {
            table,
            key,
            columns,
            kind: OperationKind::Upsert,
        }
    }

    /// Builds a delete operation.
    pub fn delete(table: &'static str, key: Vec<(String, Cell)>) -> Self {
        Self {
            table,
            key,
            columns: Vec::new(),
            kind: OperationKind::Delete,
        }
    }
}

/// Returns a stable string form of a target key, used for row addressing in
/// the in-memory store.
pub fn canonical_target_key(key: &[(String, Cell)]) -> String {
    let mut canonical = String::new();
    for (index, (name, value)) in key.iter().enumerate() {
        if index > 0 {
            canonical.push('\u{1f}');
        }
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(&value.to_string());
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_operations_carry_no_columns() {
        let op = TargetOperation::delete("users", vec![("id".to_string(), Cell::String("p1".to_string()))]);
        assert_eq!(op.kind, OperationKind::Delete);
        assert!(op.columns.is_empty());
    }

    #[test]
    fn canonical_target_key_distinguishes_composite_keys() {
        let a = canonical_target_key(&[
            ("organization_id".to_string(), Cell::String("o1".to_string())),
            ("user_id".to_string(), Cell::String("p1".to_string())),
        ]);
        let b = canonical_target_key(&[
            ("organization_id".to_string(), Cell::String("o1".to_string())),
            ("user_id".to_string(), Cell::String("p2".to_string())),
        ]);
        assert_ne!(a, b);
    }
}
