use thiserror::Error;

/// Errors from the task runtime and barrier primitive (spec §4.1, §4.2).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Stack/context allocation failed (spec §4.1 `spawn` "Fails with
    /// `OutOfResources`"). In the tokio rendition this maps to the
    /// underlying runtime failing to spawn a task, e.g. because the
    /// scheduler has already been shut down.
    #[error("out of resources spawning task: {0}")]
    OutOfResources(String),

    /// The spawned task's future panicked. spec §4.1 treats a panicking
    /// Task as fatal to the process; this crate isolates the panic to the
    /// `JoinHandle` instead (see SPEC_FULL.md §4.1) and surfaces it here so
    /// callers — specifically the dispatch engine — can decide to abort the
    /// transaction rather than crash the node.
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// The task was cancelled before completing (scheduler shutdown).
    #[error("task was cancelled before completing")]
    TaskCancelled,

    /// `wake()` was called more times than the barrier's initial count
    /// (spec §3 invariant 2: "a programming error").
    #[error("barrier woken more times than its initial count")]
    BarrierOveruse,
}
