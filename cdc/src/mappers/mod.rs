//! Per-entity mapping from change events to target operations.
//!
//! Each mapper owns the translation for one source entity: key renames,
//! column projection, and type conversion into target [`Cell`] values.
//! Mappers are pure and deterministic, which keeps redelivered events
//! mapping to identical operations.

use crate::bail;
use crate::error::{CdcResult, ErrorKind};
use crate::types::{Cell, ChangeEvent, ChangeKind, TargetOperation};

mod invitations;
mod memberships;
mod organizations;
mod profiles;

pub use invitations::InvitationsMapper;
pub use memberships::MembershipsMapper;
pub use organizations::OrganizationsMapper;
pub use profiles::ProfilesMapper;

/// Translates change events of a single source entity into target operations.
pub trait EntityMapper: Send + Sync {
    /// Name of the target table this mapper writes to.
    fn target_table(&self) -> &'static str;

    /// Maps one event into the target operation to apply.
    ///
    /// Mapping must be deterministic: the same event always yields the same
    /// operation. Events rejected by the mapper fail with
    /// [`ErrorKind::MappingFailed`].
    fn map(&self, event: &ChangeEvent) -> CdcResult<TargetOperation>;
}

/// Rejects events that should never reach a mapper.
pub(crate) fn ensure_mappable(event: &ChangeEvent) -> CdcResult<()> {
    if event.kind == ChangeKind::Malformed {
        bail!(
            ErrorKind::InvalidState,
            "malformed event reached a mapper",
            format!("entity '{}'", event.source_entity)
        );
    }

    Ok(())
}

/// Extracts a required string key attribute from the event's key map.
pub(crate) fn key_string(event: &ChangeEvent, attribute: &str) -> CdcResult<String> {
    match event.key.get(attribute).and_then(|value| value.as_str()) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => {
            bail!(
                ErrorKind::MappingFailed,
                "missing key attribute",
                format!(
                    "entity '{}' requires string key attribute '{attribute}'",
                    event.source_entity
                )
            )
        }
    }
}

/// Extracts a required string field from the post-change image.
pub(crate) fn required_string(event: &ChangeEvent, field: &str) -> CdcResult<String> {
    match optional_string(event, field) {
        Some(value) => Ok(value),
        None => {
            bail!(
                ErrorKind::MappingFailed,
                "missing required field",
                format!(
                    "entity '{}' requires string field '{field}'",
                    event.source_entity
                )
            )
        }
    }
}

/// Extracts an optional string field from the post-change image.
///
/// Absent fields and explicit nulls both map to `None`.
pub(crate) fn optional_string(event: &ChangeEvent, field: &str) -> Option<String> {
    event
        .after
        .as_ref()
        .and_then(|image| image.get(field))
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Extracts an optional RFC 3339 timestamp field as a nullable cell.
///
/// Absent fields and explicit nulls map to [`Cell::Null`]. A present but
/// unparseable timestamp is a mapping failure; silently dropping it would
/// lose data.
pub(crate) fn timestamp_cell(event: &ChangeEvent, field: &str) -> CdcResult<Cell> {
    let Some(raw) = optional_string(event, field) else {
        return Ok(Cell::Null);
    };

    match Cell::timestamp_from_rfc3339(&raw) {
        Ok(cell) => Ok(cell),
        Err(err) => {
            bail!(
                ErrorKind::MappingFailed,
                "unparseable timestamp field",
                format!(
                    "entity '{}' field '{field}' value '{raw}': {err}",
                    event.source_entity
                )
            )
        }
    }
}

/// Converts an optional string into a nullable string cell.
pub(crate) fn string_cell(value: Option<String>) -> Cell {
    value.map(Cell::String).unwrap_or(Cell::Null)
}
