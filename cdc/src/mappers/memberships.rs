use crate::error::CdcResult;
use crate::mappers::{
    EntityMapper, ensure_mappable, key_string, optional_string, timestamp_cell,
};
use crate::types::{Cell, ChangeEvent, ChangeKind, TargetOperation};

/// Default role assigned when the source record carries none.
const DEFAULT_ROLE: &str = "member";

/// Maps `organization_members` change events onto the target `memberships`
/// table.
///
/// The source composite key `organization_id` + `profile_id` becomes the
/// target composite key `organization_id` + `user_id`. Rows reference both
/// the organization and the user row, so applying a membership before its
/// organization exists fails with a constraint violation confined to that
/// event.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipsMapper;

impl MembershipsMapper {
    const TABLE: &'static str = "memberships";
}

impl EntityMapper for MembershipsMapper {
    fn target_table(&self) -> &'static str {
        Self::TABLE
    }

    fn map(&self, event: &ChangeEvent) -> CdcResult<TargetOperation> {
        ensure_mappable(event)?;

        let organization_id = key_string(event, "organization_id")?;
        let user_id = key_string(event, "profile_id")?;
        let key = vec![
            ("organization_id".to_string(), Cell::String(organization_id)),
            ("user_id".to_string(), Cell::String(user_id)),
        ];

        if event.kind == ChangeKind::Delete {
            return Ok(TargetOperation::delete(Self::TABLE, key));
        }

        let role = optional_string(event, "role").unwrap_or_else(|| DEFAULT_ROLE.to_string());
        let columns = vec![
            ("role".to_string(), Cell::String(role)),
            ("joined_at".to_string(), timestamp_cell(event, "joined_at")?),
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

    fn membership_event(kind: ChangeKind, image: Option<serde_json::Value>) -> ChangeEvent {
        let mut key = BTreeMap::new();
        key.insert("organization_id".to_string(), serde_json::json!("o1"));
        key.insert("profile_id".to_string(), serde_json::json!("p1"));

        ChangeEvent {
            source_entity: "organization_members".to_string(),
            kind,
            key,
            after: image.map(|value| value.as_object().cloned().unwrap()),
            sequence: SequenceToken::new("1"),
            malformed_reason: None,
        }
    }

    #[test]
    fn composite_key_is_renamed_for_the_target() {
        let event = membership_event(
            ChangeKind::Create,
            Some(serde_json::json!({ "role": "admin" })),
        );

        let op = MembershipsMapper.map(&event).unwrap();
        assert_eq!(op.table, "memberships");
        assert_eq!(
            op.key,
            vec![
                ("organization_id".to_string(), Cell::String("o1".to_string())),
                ("user_id".to_string(), Cell::String("p1".to_string())),
            ]
        );
        assert_eq!(op.columns[0].1, Cell::String("admin".to_string()));
    }

    #[test]
    fn missing_role_defaults_to_member() {
        let event = membership_event(ChangeKind::Create, Some(serde_json::json!({})));
        let op = MembershipsMapper.map(&event).unwrap();
        assert_eq!(op.columns[0].1, Cell::String("member".to_string()));
    }

    #[test]
    fn missing_key_half_is_a_mapping_failure() {
        let mut event = membership_event(ChangeKind::Create, Some(serde_json::json!({})));
        event.key.remove("profile_id");

        let err = MembershipsMapper.map(&event).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MappingFailed);
    }

    #[test]
    fn delete_uses_the_full_composite_key() {
        let event = membership_event(ChangeKind::Delete, None);
        let op = MembershipsMapper.map(&event).unwrap();
        assert_eq!(op.kind, OperationKind::Delete);
        assert_eq!(op.key.len(), 2);
    }
}
