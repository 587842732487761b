use mgmt_common::{OperationCode, Uuid};

/// Per-invocation scratch space a spawned Task carries so that convenience
/// operations inside it inherit the originator's identity (spec §3 "Frame").
/// The Barrier and per-peer reply slots that spec.md places inside the Frame
/// live instead in the fan-out helper's call frame (`mgmt_syncop`) and the
/// dispatch engine's transaction context (`mgmt_dispatch::TransactionContext`)
/// — this keeps `Frame` itself a plain, `Clone`-able identity tag that can be
/// captured by `tokio::task_local!` without needing interior mutability.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub originator_uuid: Uuid,
    pub operation: OperationCode,
}

impl Frame {
    pub fn new(originator_uuid: Uuid, operation: OperationCode) -> Self {
        Self { originator_uuid, operation }
    }
}
