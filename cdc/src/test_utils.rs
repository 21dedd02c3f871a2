//! Builders for raw change records used by tests.

use std::collections::BTreeMap;

use crate::normalize::{RawChange, RawChangeRecord};

/// Builds a raw change record in the source stream's shape.
pub fn record(
    entity: &str,
    event_kind: &str,
    keys: &[(&str, &str)],
    new_image: Option<serde_json::Value>,
    sequence: &str,
) -> RawChangeRecord {
    let keys: BTreeMap<String, serde_json::Value> = keys
        .iter()
        .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
        .collect();

    RawChangeRecord {
        event_id: format!("evt-{entity}-{sequence}"),
        event_kind: event_kind.to_string(),
        source: format!("arn:local:stream/table/{entity}/stream/2026-01-01T00:00:00"),
        change: RawChange {
            keys,
            new_image: new_image.and_then(|value| value.as_object().cloned()),
            old_image: None,
            sequence_number: Some(sequence.to_string()),
        },
    }
}

/// A `profiles` insert with the given id, email, and sequence token.
pub fn profile_created(id: &str, email: &str, sequence: &str) -> RawChangeRecord {
    record(
        "profiles",
        "INSERT",
        &[("profile_id", id)],
        Some(serde_json::json!({ "email": email })),
        sequence,
    )
}

/// A `profiles` update changing the email.
pub fn profile_updated(id: &str, email: &str, sequence: &str) -> RawChangeRecord {
    record(
        "profiles",
        "MODIFY",
        &[("profile_id", id)],
        Some(serde_json::json!({ "email": email })),
        sequence,
    )
}

/// A `profiles` removal.
pub fn profile_removed(id: &str, sequence: &str) -> RawChangeRecord {
    record("profiles", "REMOVE", &[("profile_id", id)], None, sequence)
}

/// An `organizations` insert.
pub fn organization_created(id: &str, name: &str, sequence: &str) -> RawChangeRecord {
    record(
        "organizations",
        "INSERT",
        &[("organization_id", id)],
        Some(serde_json::json!({ "name": name })),
        sequence,
    )
}

/// An `organization_members` insert.
pub fn membership_created(
    organization_id: &str,
    profile_id: &str,
    role: &str,
    sequence: &str,
) -> RawChangeRecord {
    record(
        "organization_members",
        "INSERT",
        &[("organization_id", organization_id), ("profile_id", profile_id)],
        Some(serde_json::json!({ "role": role })),
        sequence,
    )
}

/// An `invitations` insert.
pub fn invitation_created(
    id: &str,
    organization_id: &str,
    email: &str,
    sequence: &str,
) -> RawChangeRecord {
    record(
        "invitations",
        "INSERT",
        &[("invitation_id", id)],
        Some(serde_json::json!({ "organization_id": organization_id, "email": email })),
        sequence,
    )
}

/// An insert from an entity no mapper is registered for.
pub fn unmapped_record(entity: &str, sequence: &str) -> RawChangeRecord {
    record(
        entity,
        "INSERT",
        &[("id", "x1")],
        Some(serde_json::json!({ "payload": "ignored" })),
        sequence,
    )
}

/// A record that fails normalization (no key attributes).
pub fn malformed_record(entity: &str, sequence: &str) -> RawChangeRecord {
    let mut raw = record(entity, "INSERT", &[], Some(serde_json::json!({})), sequence);
    raw.change.keys.clear();
    raw
}
