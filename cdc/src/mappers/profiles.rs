use crate::error::CdcResult;
use crate::mappers::{
    EntityMapper, ensure_mappable, key_string, optional_string, required_string, string_cell,
    timestamp_cell,
};
use crate::types::{Cell, ChangeEvent, ChangeKind, TargetOperation};

/// Maps `profiles` change events onto the target `users` table.
///
/// The source key attribute `profile_id` becomes the target primary key
/// `id`. An upsert requires an `email`; the remaining columns are nullable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfilesMapper;

impl ProfilesMapper {
    const TABLE: &'static str = "users";
}

impl EntityMapper for ProfilesMapper {
    fn target_table(&self) -> &'static str {
        Self::TABLE
    }

    fn map(&self, event: &ChangeEvent) -> CdcResult<TargetOperation> {
        ensure_mappable(event)?;

        let id = key_string(event, "profile_id")?;
        let key = vec![("id".to_string(), Cell::String(id))];

        if event.kind == ChangeKind::Delete {
            return Ok(TargetOperation::delete(Self::TABLE, key));
        }

        let columns = vec![
            (
                "email".to_string(),
                Cell::String(required_string(event, "email")?),
            ),
            ("name".to_string(), string_cell(optional_string(event, "name"))),
            (
                "avatar_url".to_string(),
                string_cell(optional_string(event, "avatar_url")),
            ),
            ("created_at".to_string(), timestamp_cell(event, "created_at")?),
            ("updated_at".to_string(), timestamp_cell(event, "updated_at")?),
        ];

        Ok(TargetOperation::upsert(Self::TABLE, key, columns))
    }
}
