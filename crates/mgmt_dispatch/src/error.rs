use mgmt_runtime::RuntimeError;
use thiserror::Error;

/// Setup-time failures the dispatch engine can hit before any lock has been
/// taken — these short-circuit `execute` with an `Err` rather than folding
/// into a [`crate::DispatchResult`], since no cleanup-on-abort obligation
/// exists yet (spec §3 invariant 5 only binds once a lock is acquired).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A `<type>count` key named more entities than the dictionary actually
    /// carries `<type>name<N>` entries for (spec §6 dictionary keys).
    #[error("malformed request dictionary: {0}")]
    MalformedInput(String),

    /// The transaction's Task panicked or was cancelled by the scheduler
    /// before the engine could observe a phase outcome.
    #[error("dispatch task failed: {0}")]
    Runtime(#[from] RuntimeError),
}
