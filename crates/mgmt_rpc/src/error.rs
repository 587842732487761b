use mgmt_common::{CoordinatorError, Uuid};
use thiserror::Error;

/// Errors from a single RPC call through an [`crate::RpcChannel`].
#[derive(Clone, Debug, Error)]
pub enum RpcError {
    /// The peer is unreachable, its channel is closed, or it never replied.
    #[error("transport failure contacting peer {peer}: {detail}")]
    Transport { peer: Uuid, detail: String },

    /// A non-blocking operation (spec §4.4 `try_inode_lock`) could not make
    /// progress without blocking.
    #[error("operation would block")]
    WouldBlock,

    /// The peer's handler rejected a malformed request payload.
    #[error("failed to decode payload: {0}")]
    Decode(String),
}

impl From<RpcError> for CoordinatorError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport { peer, detail } => CoordinatorError::Transport { peer, detail },
            RpcError::WouldBlock => CoordinatorError::Internal("would-block reached the dispatch boundary".into()),
            RpcError::Decode(detail) => CoordinatorError::Decode(detail),
        }
    }
}
