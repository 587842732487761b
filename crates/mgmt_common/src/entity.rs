use serde::{Deserialize, Serialize};

/// The closed set of lockable entity types (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Volume,
    Snapshot,
    Global,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Volume => "volume",
            EntityType::Snapshot => "snapshot",
            EntityType::Global => "global",
        }
    }

    /// Whether this entity type is locked per-transaction by default (spec §4.3).
    pub fn default_locked_per_transaction(self) -> bool {
        matches!(self, EntityType::Volume)
    }
}

/// A lock/entity key: `(entity-type, entity-name)` (spec §3 "Lock Record").
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: EntityType,
    pub entity_name: String,
}

impl EntityKey {
    pub fn new(entity_type: EntityType, entity_name: impl Into<String>) -> Self {
        Self { entity_type, entity_name: entity_name.into() }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type.as_str(), self.entity_name)
    }
}
