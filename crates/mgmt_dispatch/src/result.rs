use mgmt_common::Dict;

/// The CLI-facing response of spec §7: `(op_ret, op_errno, op_errstr)` plus
/// the accumulated transaction dictionary. Constructed only after every
/// unlock attempt has returned (spec §4.5 invariant 6 "CLI response last").
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub op_ret: i32,
    pub op_errno: i32,
    pub op_errstr: String,
    pub dict: Dict,
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        self.op_ret == 0
    }
}
