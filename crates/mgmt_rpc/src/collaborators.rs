use async_trait::async_trait;
use mgmt_common::{CoordinatorError, Dict, OperationCode};

/// Which half of the Brick-Op phase is running (spec §4.5 phase table:
/// `MGMT_V3_BRICK_OP` fires once before commit and once after).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrickOpPhase {
    Pre,
    Post,
}

/// The pre-validate collaborator (spec §6). Invoked both as the local
/// in-process call and, through `mgmt_rpc::RpcChannel`, against each
/// eligible peer.
#[async_trait]
pub trait PreValidateFn: Send + Sync {
    async fn pre_validate(&self, op: &OperationCode, dict: &Dict) -> Result<Dict, CoordinatorError>;
}

/// The brick-op collaborator, covering both the pre-commit and post-commit
/// invocations named in the phase table.
#[async_trait]
pub trait BrickOpFn: Send + Sync {
    async fn brick_op(&self, phase: BrickOpPhase, op: &OperationCode, dict: &Dict) -> Result<Dict, CoordinatorError>;
}

/// The commit collaborator. Unlike pre/post-validate, commit is never
/// replayed by the engine (spec §4.5 "Idempotence"), so implementations are
/// not required to be idempotent.
#[async_trait]
pub trait CommitFn: Send + Sync {
    async fn commit(&self, op: &OperationCode, dict: &Dict) -> Result<Dict, CoordinatorError>;
}

/// The post-validate collaborator. `op_ret` carries the transaction's
/// aggregated outcome so far (spec §6 `MGMT_V3_POST_VALIDATE { op_ret, ... }`),
/// so an implementation can distinguish a normal finalize (`op_ret == 0`)
/// from cleanup after an earlier phase aborted.
#[async_trait]
pub trait PostValidateFn: Send + Sync {
    async fn post_validate(&self, op: &OperationCode, op_ret: i32, dict: &Dict) -> Result<Dict, CoordinatorError>;
}
