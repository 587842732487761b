use mgmt_common::Uuid;

/// A cluster peer's roster entry (spec §3 "Peer").
///
/// `uuid` doubles as the "rpc_handle" spec.md's data model lists as a
/// separate field: `mgmt_rpc::RpcChannel::call` addresses peers by `Uuid`
/// directly, so carrying a second handle here would only duplicate the key
/// the map is already indexed by — and would pull `mgmt_rpc` into this
/// crate's dependency graph for no new information.
#[derive(Clone, Debug, PartialEq)]
pub struct Peer {
    pub uuid: Uuid,
    pub hostname: String,
    pub connected: bool,
    /// Mutual "friendship" state gating a non-relaxed fan-out (spec §4.5).
    pub friendship: bool,
    /// The roster generation at which this peer was last added or updated.
    pub generation: u64,
}
