use crate::error::CdcResult;
use crate::mappers::{
    EntityMapper, ensure_mappable, key_string, optional_string, required_string, string_cell,
    timestamp_cell,
};
use crate::types::{Cell, ChangeEvent, ChangeKind, TargetOperation};

/// Maps `organizations` change events onto the target `organizations` table.
///
/// The source key attribute `organization_id` becomes `id`; the source's
/// `owner_profile_id` is projected as `owner_id` to match the target schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationsMapper;

impl OrganizationsMapper {
    const TABLE: &'static str = "organizations";
}

impl EntityMapper for OrganizationsMapper {
    fn target_table(&self) -> &'static str {
        Self::TABLE
    }

    fn map(&self, event: &ChangeEvent) -> CdcResult<TargetOperation> {
        ensure_mappable(event)?;

        let id = key_string(event, "organization_id")?;
        let key = vec![("id".to_string(), Cell::String(id))];

        if event.kind == ChangeKind::Delete {
            return Ok(TargetOperation::delete(Self::TABLE, key));
        }

        let columns = vec![
            (
                "name".to_string(),
                Cell::String(required_string(event, "name")?),
            ),
            (
                "owner_id".to_string(),
                string_cell(optional_string(event, "owner_profile_id")),
            ),
            ("created_at".to_string(), timestamp_cell(event, "created_at")?),
            ("updated_at".to_string(), timestamp_cell(event, "updated_at")?),
        ];

        Ok(TargetOperation::upsert(Self::TABLE, key, columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{OperationKind, SequenceToken};
    use std::collections::BTreeMap;

    fn organization_event(kind: ChangeKind, image: Option<serde_json::Value>) -> ChangeEvent {
        let mut key = BTreeMap::new();
        key.insert("organization_id".to_string(), serde_json::json!("o1"));

        ChangeEvent {
            source_entity: "organizations".to_string(),
            kind,
            key,
            after: image.map(|value| value.as_object().cloned().unwrap()),
            sequence: SequenceToken::new("1"),
            malformed_reason: None,
        }
    }

    #[test]
    fn owner_key_is_renamed_for_the_target() {
        let event = organization_event(
            ChangeKind::Create,
            Some(serde_json::json!({
                "name": "Acme",
                "owner_profile_id": "p1",
            })),
        );

        let op = OrganizationsMapper.map(&event).unwrap();
        assert_eq!(op.table, "organizations");
        assert_eq!(op.key, vec![("id".to_string(), Cell::String("o1".to_string()))]);
        assert_eq!(
            op.columns[1],
            ("owner_id".to_string(), Cell::String("p1".to_string()))
        );
    }

    #[test]
    fn missing_name_is_a_mapping_failure() {
        let event = organization_event(
            ChangeKind::Update,
            Some(serde_json::json!({ "owner_profile_id": "p1" })),
        );

        let err = OrganizationsMapper.map(&event).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MappingFailed);
    }

    #[test]
    fn delete_requires_only_the_key() {
        let event = organization_event(ChangeKind::Delete, None);
        let op = OrganizationsMapper.map(&event).unwrap();
        assert_eq!(op.kind, OperationKind::Delete);
    }
}
