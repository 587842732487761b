use std::time::Instant;

use mgmt_common::Uuid;

/// The evidence that an entity is currently reserved (spec §3 "Lock Record").
#[derive(Clone, Debug)]
pub struct LockRecord {
    pub owner: Uuid,
    pub acquired_at: Instant,
}

/// Diagnostics for a held lock (spec §9 "Backtrace capture for diagnostics"),
/// additive instrumentation on top of the record itself.
#[derive(Clone, Debug)]
pub struct LockDiagnostics {
    pub owner: Uuid,
    pub acquired_at: Instant,
    pub backtrace: String,
}
