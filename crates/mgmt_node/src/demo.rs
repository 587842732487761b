//! Demo collaborators: the opaque callbacks spec §6 leaves to "the
//! surrounding system". These accept everything and log what they saw,
//! standing in for a real brick translator.

use async_trait::async_trait;
use mgmt_common::{CoordinatorError, Dict, OperationCode, Uuid};
use mgmt_rpc::{BrickOpFn, BrickOpPhase, CommitFn, PeerHandler, PostValidateFn, PreValidateFn, RpcError, RpcRequest, RpcResponse};
use tracing::info;

/// Accepts every phase unconditionally, logging the phase name and peer
/// identity it ran under. Good enough to exercise the dispatch engine
/// end to end without a real storage brick behind it.
pub struct DemoCollaborators;

#[async_trait]
impl PreValidateFn for DemoCollaborators {
    async fn pre_validate(&self, op: &OperationCode, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        info!(%op, "pre-validate accepted locally");
        Ok(Dict::new())
    }
}

#[async_trait]
impl BrickOpFn for DemoCollaborators {
    async fn brick_op(&self, phase: BrickOpPhase, op: &OperationCode, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        info!(%op, ?phase, "brick-op accepted locally");
        Ok(Dict::new())
    }
}

#[async_trait]
impl CommitFn for DemoCollaborators {
    async fn commit(&self, op: &OperationCode, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        info!(%op, "commit accepted locally");
        Ok(Dict::new())
    }
}

#[async_trait]
impl PostValidateFn for DemoCollaborators {
    async fn post_validate(&self, op: &OperationCode, op_ret: i32, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        info!(%op, op_ret, "post-validate accepted locally");
        Ok(Dict::new())
    }
}

/// A peer-side handler backing a demo peer node over [`LocalLoopbackChannel`]:
/// replies OK to every phase, tagging the response with the peer's own
/// UUID (spec §6's wire responses always carry the responding peer's uuid).
pub struct DemoPeer {
    pub uuid: Uuid,
}

#[async_trait]
impl PeerHandler for DemoPeer {
    async fn handle(&self, request: RpcRequest) -> Result<RpcResponse, RpcError> {
        info!(peer = %self.uuid, phase = request.request_label(), "peer handled phase");
        Ok(RpcResponse::ok(self.uuid, request.dict().clone()))
    }
}
