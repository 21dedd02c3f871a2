//! Static routing from source entities to their mappers.

use std::collections::HashMap;

use tracing::debug;

use crate::mappers::{
    EntityMapper, InvitationsMapper, MembershipsMapper, OrganizationsMapper, ProfilesMapper,
};

/// The source entities the synchronizer knows how to map.
///
/// Routing is static: the full entity set is fixed at build time, and events
/// from any other entity are skipped as unmapped rather than failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEntity {
    Profiles,
    Organizations,
    OrganizationMembers,
    Invitations,
}

impl SourceEntity {
    /// All routable entities.
    pub const ALL: [SourceEntity; 4] = [
        SourceEntity::Profiles,
        SourceEntity::Organizations,
        SourceEntity::OrganizationMembers,
        SourceEntity::Invitations,
    ];

    /// The entity's name as it appears in source provenance identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceEntity::Profiles => "profiles",
            SourceEntity::Organizations => "organizations",
            SourceEntity::OrganizationMembers => "organization_members",
            SourceEntity::Invitations => "invitations",
        }
    }

    /// Parses a source entity name, returning `None` for unmapped entities.
    pub fn parse(name: &str) -> Option<SourceEntity> {
        Self::ALL.into_iter().find(|entity| entity.as_str() == name)
    }

    fn mapper(&self) -> Box<dyn EntityMapper> {
        match self {
            SourceEntity::Profiles => Box::new(ProfilesMapper),
            SourceEntity::Organizations => Box::new(OrganizationsMapper),
            SourceEntity::OrganizationMembers => Box::new(MembershipsMapper),
            SourceEntity::Invitations => Box::new(InvitationsMapper),
        }
    }
}

/// Dispatches change events to the mapper registered for their entity.
pub struct Router {
    mappers: HashMap<SourceEntity, Box<dyn EntityMapper>>,
}

impl Router {
    /// Builds a router with the full set of built-in mappers.
    pub fn with_default_mappers() -> Self {
        let mappers = SourceEntity::ALL
            .into_iter()
            .map(|entity| (entity, entity.mapper()))
            .collect();

        Self { mappers }
    }

    /// Returns the mapper for `source_entity`, or `None` when the entity is
    /// not routable.
    pub fn route(&self, source_entity: &str) -> Option<&dyn EntityMapper> {
        let Some(entity) = SourceEntity::parse(source_entity) else {
            debug!(source_entity, "no mapper registered for entity");
            return None;
        };

        self.mappers.get(&entity).map(Box::as_ref)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::with_default_mappers()
    }
}
