use thiserror::Error;

/// The error taxonomy of spec §7, ordinal rather than named after any
/// source-language error type. Every per-crate error enum in this workspace
/// (`LockError`, `RuntimeError`, `RpcError`, `DispatchError`) converts into
/// this one at its crate boundary, the way
/// `apollo_infra::component_client::definitions::ClientError` is the single
/// public error type client callers see regardless of which transport
/// failed underneath.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoordinatorError {
    /// RPC status was failure; treated as `ENOTCONN`.
    #[error("transport failure contacting peer {peer}: {detail}")]
    Transport { peer: uuid::Uuid, detail: String },

    /// Payload decode failure; treated as a malformed request.
    #[error("failed to decode payload: {0}")]
    Decode(String),

    /// Lock already held by another UUID.
    #[error("entity {entity} already held by another transaction")]
    AnotherTransaction { entity: String },

    /// Release attempted by a non-owner.
    #[error("release of {entity} attempted by non-owner {requester}")]
    LockOwnerMismatch { entity: String, requester: uuid::Uuid },

    /// Release or acquire-adjacent lookup of an entity that has no record.
    #[error("no lock held for {entity}")]
    LockNotHeld { entity: String },

    /// The originator node's own callback rejected the phase.
    #[error("local phase {phase} failed: {detail}")]
    LocalPhaseFailure { phase: String, detail: String },

    /// A peer's callback rejected the phase; surfaced verbatim.
    #[error("peer {peer} phase {phase} failed: {detail}")]
    PeerPhaseFailure { peer: uuid::Uuid, phase: String, detail: String },

    /// Catch-all mapped to a non-zero op_errno to ensure the CLI receives a
    /// failure indication.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    /// Maps a failure onto the wire-level `(op_ret, op_errno)` pair of spec
    /// §6/§7. `StaleGeneration` has no variant here because spec §7 defines
    /// it as "not an error — skipped silently"; it never reaches this
    /// conversion.
    pub fn op_errno(&self) -> ErrnoCode {
        match self {
            CoordinatorError::Transport { .. } => ErrnoCode::NOTCONN,
            CoordinatorError::Decode(_) => ErrnoCode::INVAL,
            CoordinatorError::AnotherTransaction { .. } => ErrnoCode::BUSY,
            CoordinatorError::LockOwnerMismatch { .. } => ErrnoCode::PERM,
            CoordinatorError::LockNotHeld { .. } => ErrnoCode::NOENT,
            CoordinatorError::LocalPhaseFailure { .. } => ErrnoCode::FAILED,
            CoordinatorError::PeerPhaseFailure { .. } => ErrnoCode::FAILED,
            CoordinatorError::Internal(_) => ErrnoCode::INTERNAL,
        }
    }
}

/// A small, stable errno-like code surfaced in the CLI response's
/// `op_errno` field (spec §6/§7). Not a full POSIX errno mapping — just
/// enough to distinguish the failure classes the taxonomy names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrnoCode {
    NOTCONN,
    INVAL,
    BUSY,
    PERM,
    NOENT,
    FAILED,
    INTERNAL,
}

impl ErrnoCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ErrnoCode::NOTCONN => 107,
            ErrnoCode::INVAL => 22,
            ErrnoCode::BUSY => 16,
            ErrnoCode::PERM => 1,
            ErrnoCode::NOENT => 2,
            ErrnoCode::FAILED => 255,
            ErrnoCode::INTERNAL => 5,
        }
    }
}
