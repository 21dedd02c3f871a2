use crate::error::CdcResult;
use crate::mappers::{
    EntityMapper, ensure_mappable, key_string, optional_string, required_string, string_cell,
    timestamp_cell,
};
use crate::types::{Cell, ChangeEvent, ChangeKind, TargetOperation};

/// Maps `invitations` change events onto the target `invitations` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvitationsMapper;

impl InvitationsMapper {
    const TABLE: &'static str = "invitations";
}

impl EntityMapper for InvitationsMapper {
    fn target_table(&self) -> &'static str {
        Self::TABLE
    }

    fn map(&self, event: &ChangeEvent) -> CdcResult<TargetOperation> {
        ensure_mappable(event)?;

        let id = key_string(event, "invitation_id")?;
        let key = vec![("id".to_string(), Cell::String(id))];

        if event.kind == ChangeKind::Delete {
            return Ok(TargetOperation::delete(Self::TABLE, key));
        }

        let columns = vec![
            (
                "organization_id".to_string(),
                Cell::String(required_string(event, "organization_id")?),
            ),
            (
                "email".to_string(),
                Cell::String(required_string(event, "email")?),
            ),
            (
                "status".to_string(),
                string_cell(optional_string(event, "status")),
            ),
            ("expires_at".to_string(), timestamp_cell(event, "expires_at")?),
        ];

        Ok(TargetOperation::upsert(Self::TABLE, key, columns))
    }
}
