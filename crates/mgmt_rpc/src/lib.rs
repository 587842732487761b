//! Wire protocol and RPC channel abstraction (spec §6 "External Interfaces").

mod channel;
mod collaborators;
mod error;
mod messages;
mod scripted;

pub use channel::{LocalLoopbackChannel, PeerHandler, RpcChannel};
pub use collaborators::{BrickOpFn, BrickOpPhase, CommitFn, PostValidateFn, PreValidateFn};
pub use error::RpcError;
pub use messages::{RpcRequest, RpcResponse};
pub use scripted::{Scripted, ScriptedChannel};
