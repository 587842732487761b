//! Shared vocabulary for the cluster management-plane coordinator: the
//! opaque dictionary payload, entity/operation identifiers, and the error
//! taxonomy every other crate in the workspace converts into.

mod dict;
mod entity;
mod error;

pub use dict::Dict;
pub use entity::{EntityKey, EntityType};
pub use error::{CoordinatorError, ErrnoCode};

pub use uuid::Uuid;

/// Well-known dictionary keys observed by the core (spec §6).
pub mod keys {
    pub const IS_SYNCTASKED: &str = "is_synctasked";
    pub const ORIGINATOR_UUID: &str = "originator_uuid";
    pub const OPERATION_TYPE: &str = "operation-type";

    /// `hold_<type>_locks` — override the default lock policy for an entity type.
    pub fn hold_locks(entity_type: super::EntityType) -> String {
        format!("hold_{}_locks", entity_type.as_str())
    }

    /// `<type>count` — number of entities of a given type to lock.
    pub fn count(entity_type: super::EntityType) -> String {
        format!("{}count", entity_type.as_str())
    }

    /// `<type>name<N>` — the Nth entity name of a given type (1-indexed).
    pub fn name(entity_type: super::EntityType, index: usize) -> String {
        format!("{}name{}", entity_type.as_str(), index)
    }
}

/// The administrative operation a transaction carries end to end. The set is
/// open (unlike the fan-out file-system operations in `mgmt_syncop`, which
/// are a closed enum) because new management commands are added without
/// touching the dispatch engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OperationCode(pub String);

impl OperationCode {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The special `SYNC_VOLUME` operation relaxes the friendship eligibility
    /// filter (spec §4.5 "Eligibility filter").
    pub fn relaxes_friendship_filter(&self) -> bool {
        self.0 == "SYNC_VOLUME"
    }
}

impl std::fmt::Display for OperationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OperationCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
