use mgmt_common::{CoordinatorError, EntityKey, Uuid};
use thiserror::Error;

/// Errors from a single lock operation (spec §4.3).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LockError {
    /// `acquire` found a record owned by someone else.
    #[error("{entity} already held by another transaction")]
    AlreadyHeld { entity: EntityKey },

    /// `release`/`acquire_many` rollback found no record for the key.
    #[error("no lock held for {entity}")]
    NotHeld { entity: EntityKey },

    /// `release` attempted by a UUID that does not own the record.
    #[error("{entity} held by another owner, release attempted by {requester}")]
    OwnerMismatch { entity: EntityKey, requester: Uuid },

    /// `acquire_many` aborted partway through; all locks it had taken in
    /// this call were rolled back before returning.
    #[error("acquire_many aborted: {source}")]
    PartialFail { source: Box<LockError> },
}

impl From<LockError> for CoordinatorError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AlreadyHeld { entity } => CoordinatorError::AnotherTransaction { entity: entity.to_string() },
            LockError::NotHeld { entity } => CoordinatorError::LockNotHeld { entity: entity.to_string() },
            LockError::OwnerMismatch { entity, requester } => {
                CoordinatorError::LockOwnerMismatch { entity: entity.to_string(), requester }
            }
            LockError::PartialFail { source } => (*source).into(),
        }
    }
}
