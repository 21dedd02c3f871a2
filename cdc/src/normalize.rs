//! Change record normalization.
//!
//! Parses raw, provider-specific change-log records into canonical
//! [`ChangeEvent`]s. Normalization is a pure transform: malformed records
//! become [`ChangeKind::Malformed`] events carrying the reason instead of
//! raising, so a single bad record never aborts a batch.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use crate::types::{ChangeEvent, ChangeKind, SequenceToken};

/// Event-type tag for row creation in the source log's vocabulary.
const TAG_INSERT: &str = "INSERT";
/// Event-type tag for row modification.
const TAG_MODIFY: &str = "MODIFY";
/// Event-type tag for row removal.
const TAG_REMOVE: &str = "REMOVE";

/// Path segment preceding the table name in the source identifier.
const SOURCE_TABLE_SEGMENT: &str = "table";

/// A raw change-log record as delivered by the source stream.
///
/// The transport and envelope encoding belong to the invoking collaborator;
/// the synchronizer only requires that these fields be extractable.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChangeRecord {
    /// Provider-assigned record identifier, used for log correlation only.
    pub event_id: String,
    /// Event-type tag: `INSERT`, `MODIFY`, or `REMOVE`.
    pub event_kind: String,
    /// Provenance identifier with the originating table name embedded,
    /// e.g. `…/table/profiles/stream/2026-01-01T00:00:00`.
    pub source: String,
    /// The structured change body.
    #[serde(default)]
    pub change: RawChange,
}

/// Key/value payload of a raw change record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChange {
    /// Key attributes identifying the source row.
    #[serde(default)]
    pub keys: BTreeMap<String, serde_json::Value>,
    /// Full post-change image; absent for removals.
    #[serde(default)]
    pub new_image: Option<serde_json::Map<String, serde_json::Value>>,
    /// Full pre-change image when the stream provides one.
    #[serde(default)]
    pub old_image: Option<serde_json::Map<String, serde_json::Value>>,
    /// The log's sequence number for this record.
    #[serde(default)]
    pub sequence_number: Option<String>,
}

/// Normalizes an ordered raw batch into an ordered [`ChangeEvent`] sequence.
///
/// Delivery order is preserved one-to-one: the event at position `i`
/// corresponds to the record at position `i`.
pub fn normalize_batch(records: &[RawChangeRecord]) -> Vec<ChangeEvent> {
    records.iter().map(normalize_record).collect()
}

/// Normalizes a single raw record.
fn normalize_record(record: &RawChangeRecord) -> ChangeEvent {
    let source_entity = entity_from_source(&record.source);
    let sequence = record
        .change
        .sequence_number
        .as_deref()
        .map(SequenceToken::new);

    let Some(kind) = kind_from_tag(&record.event_kind) else {
        return malformed_event(record, source_entity, sequence, "unknown event-type tag");
    };

    if record.change.keys.is_empty() {
        return malformed_event(record, source_entity, sequence, "missing key attributes");
    }

    let Some(sequence) = sequence else {
        return malformed_event(record, source_entity, None, "missing sequence number");
    };

    let after = match kind {
        ChangeKind::Delete => None,
        _ => match &record.change.new_image {
            Some(image) => Some(image.clone()),
            None => {
                return malformed_event(
                    record,
                    source_entity,
                    Some(sequence),
                    "missing post-change image",
                );
            }
        },
    };

    ChangeEvent {
        source_entity,
        kind,
        key: record.change.keys.clone(),
        after,
        sequence,
        malformed_reason: None,
    }
}

/// Builds the malformed event for a record that failed normalization.
fn malformed_event(
    record: &RawChangeRecord,
    source_entity: String,
    sequence: Option<SequenceToken>,
    reason: &str,
) -> ChangeEvent {
    warn!(
        event_id = %record.event_id,
        source = %record.source,
        reason,
        "malformed change record"
    );

    ChangeEvent {
        source_entity,
        kind: ChangeKind::Malformed,
        key: record.change.keys.clone(),
        after: None,
        sequence: sequence.unwrap_or_else(|| SequenceToken::new("0")),
        malformed_reason: Some(reason.to_string()),
    }
}

/// Extracts the originating table name from the record's provenance field.
///
/// The identifier embeds the table name after a `table` path segment. When
/// no such segment exists the whole identifier is used, which routes to
/// "unmapped entity" downstream rather than failing normalization.
fn entity_from_source(source: &str) -> String {
    let mut segments = source.split('/');

    while let Some(segment) = segments.next() {
        if segment == SOURCE_TABLE_SEGMENT {
            if let Some(table) = segments.next() {
                if !table.is_empty() {
                    return table.to_string();
                }
            }
        }
    }

    source.to_string()
}

/// Maps the provider's event-type tag onto a [`ChangeKind`].
fn kind_from_tag(tag: &str) -> Option<ChangeKind> {
    match tag {
        TAG_INSERT => Some(ChangeKind::Create),
        TAG_MODIFY => Some(ChangeKind::Update),
        TAG_REMOVE => Some(ChangeKind::Delete),
        _ => None,
    }
}
