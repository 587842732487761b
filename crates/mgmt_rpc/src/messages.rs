use mgmt_common::{Dict, OperationCode, Uuid};

/// The six wire messages of spec §6, one variant each. A `RequestWrapper`'s
/// `Debug` impl in the teacher's `apollo_infra::component_definitions`
/// prints only the discriminant name, not the payload — this one does the
/// same via `request_label`, so logging a request never spills a peer's
/// dictionary contents into the trace.
pub enum RpcRequest {
    Lock { uuid: Uuid, op: OperationCode, dict: Dict },
    PreValidate { uuid: Uuid, op: OperationCode, dict: Dict },
    BrickOpPre { uuid: Uuid, op: OperationCode, dict: Dict },
    Commit { uuid: Uuid, op: OperationCode, dict: Dict },
    BrickOpPost { uuid: Uuid, op: OperationCode, dict: Dict },
    /// Carries the transaction's `op_ret` so far (spec §6 `MGMT_V3_POST_VALIDATE
    /// { uuid, op, op_ret, dict-blob }`), letting a peer distinguish a normal
    /// finalize from a cleanup-after-abort.
    PostValidate { uuid: Uuid, op: OperationCode, op_ret: i32, dict: Dict },
    Unlock { uuid: Uuid, op: OperationCode, dict: Dict },
}

impl RpcRequest {
    pub fn request_label(&self) -> &'static str {
        match self {
            RpcRequest::Lock { .. } => "MGMT_V3_LOCK",
            RpcRequest::PreValidate { .. } => "MGMT_V3_PRE_VALIDATE",
            RpcRequest::BrickOpPre { .. } => "MGMT_V3_BRICK_OP_PRE",
            RpcRequest::Commit { .. } => "MGMT_V3_COMMIT",
            RpcRequest::BrickOpPost { .. } => "MGMT_V3_BRICK_OP_POST",
            RpcRequest::PostValidate { .. } => "MGMT_V3_POST_VALIDATE",
            RpcRequest::Unlock { .. } => "MGMT_V3_UNLOCK",
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            RpcRequest::Lock { uuid, .. }
            | RpcRequest::PreValidate { uuid, .. }
            | RpcRequest::BrickOpPre { uuid, .. }
            | RpcRequest::Commit { uuid, .. }
            | RpcRequest::BrickOpPost { uuid, .. }
            | RpcRequest::PostValidate { uuid, .. }
            | RpcRequest::Unlock { uuid, .. } => *uuid,
        }
    }

    pub fn dict(&self) -> &Dict {
        match self {
            RpcRequest::Lock { dict, .. }
            | RpcRequest::PreValidate { dict, .. }
            | RpcRequest::BrickOpPre { dict, .. }
            | RpcRequest::Commit { dict, .. }
            | RpcRequest::BrickOpPost { dict, .. }
            | RpcRequest::PostValidate { dict, .. }
            | RpcRequest::Unlock { dict, .. } => dict,
        }
    }
}

impl std::fmt::Debug for RpcRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcRequest::{}(uuid={})", self.request_label(), self.uuid())
    }
}

/// `{ uuid, op_ret, op_errno, op_errstr }` per spec §6, carrying the response
/// dictionary a successful phase built up. `op_errstr` is empty on success.
pub struct RpcResponse {
    pub uuid: Uuid,
    pub op_ret: i32,
    pub op_errno: i32,
    pub op_errstr: String,
    pub dict: Dict,
}

impl RpcResponse {
    pub fn ok(uuid: Uuid, dict: Dict) -> Self {
        Self { uuid, op_ret: 0, op_errno: 0, op_errstr: String::new(), dict }
    }

    pub fn failure(uuid: Uuid, op_errno: i32, op_errstr: impl Into<String>) -> Self {
        Self { uuid, op_ret: -1, op_errno, op_errstr: op_errstr.into(), dict: Dict::new() }
    }

    pub fn is_ok(&self) -> bool {
        self.op_ret == 0
    }
}

impl std::fmt::Debug for RpcResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcResponse(uuid={}, op_ret={}, op_errno={}, op_errstr={:?})", self.uuid, self.op_ret, self.op_errno, self.op_errstr)
    }
}
