use std::sync::Mutex;

use mgmt_common::{keys, CoordinatorError, Dict, OperationCode, Uuid};
use mgmt_rpc::RpcResponse;

/// Per-transaction state threaded through all six phases (spec §3
/// "Transaction Context"). The response dictionary lives behind a plain
/// `std::sync::Mutex`: merges are synchronous map inserts, never held
/// across an `.await`, matching the workspace's `await_holding_lock` lint.
pub struct TransactionContext {
    pub originator_uuid: Uuid,
    pub op: OperationCode,
    pub input: Dict,
    response: Mutex<Dict>,
    pub is_acquired: bool,
    pub saved_roster_generation: u64,
    pub peers_contacted: Vec<Uuid>,
    op_ret: i32,
    op_errno: i32,
    errors: Vec<String>,
}

impl TransactionContext {
    pub fn new(originator_uuid: Uuid, op: OperationCode, mut input: Dict, saved_roster_generation: u64) -> Self {
        input.insert(keys::ORIGINATOR_UUID, originator_uuid.to_string());
        Self {
            originator_uuid,
            op,
            input,
            response: Mutex::new(Dict::new()),
            is_acquired: false,
            saved_roster_generation,
            peers_contacted: Vec::new(),
            op_ret: 0,
            op_errno: 0,
            errors: Vec::new(),
        }
    }

    /// First non-OK `(op_ret, op_errno)` wins (spec §4.5 "Aggregation rule");
    /// later failures only extend the collated error string.
    pub fn record_failure(&mut self, message: impl Into<String>, err: &CoordinatorError) {
        if self.op_ret == 0 {
            self.op_ret = -1;
            self.op_errno = err.op_errno().as_i32();
        }
        self.errors.push(message.into());
    }

    pub fn merge_peer_dict(&self, dict: &Dict) {
        self.response.lock().expect("response dict mutex poisoned").merge_from(dict);
    }

    pub fn merge_local_dict(&self, dict: &Dict) {
        self.merge_peer_dict(dict);
    }

    pub fn has_failed(&self) -> bool {
        self.op_ret != 0
    }

    pub fn op_ret(&self) -> i32 {
        self.op_ret
    }

    pub fn op_errno(&self) -> i32 {
        self.op_errno
    }

    /// The newline-joined collated error string (spec §7 "user-visible
    /// failure"). Falls back to a generic message if a failure was recorded
    /// without per-peer detail (should not happen in practice, but keeps
    /// the CLI response contract honest).
    pub fn collated_errstr(&self) -> String {
        if self.errors.is_empty() {
            if self.has_failed() {
                "transaction failed with no further detail".to_string()
            } else {
                String::new()
            }
        } else {
            self.errors.join("\n")
        }
    }

    pub fn response_dict(&self) -> Dict {
        self.response.lock().expect("response dict mutex poisoned").clone()
    }

    /// Merges a peer's reply and, if it reports failure, records the
    /// per-peer error (spec §4.5 "Reply callbacks ... compose a
    /// human-readable per-peer error string").
    pub fn apply_peer_reply(&mut self, peer: Uuid, phase: &str, reply: &RpcResponse) {
        self.merge_peer_dict(&reply.dict);
        if !reply.is_ok() {
            let detail = if reply.op_errstr.is_empty() {
                format!("op_errno={}", reply.op_errno)
            } else {
                reply.op_errstr.clone()
            };
            self.record_failure(
                format!("peer {peer} failed phase {phase}: {detail}"),
                &CoordinatorError::PeerPhaseFailure { peer, phase: phase.to_string(), detail },
            );
        }
    }
}
