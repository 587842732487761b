use std::future::Future;

use tokio::task::JoinHandle;

use crate::error::RuntimeError;
use crate::frame::Frame;

tokio::task_local! {
    static CURRENT_FRAME: Frame;
}

/// Returns the [`Frame`] of the task currently executing, mirroring spec
/// §4.1's `current()` contract. Panics if called outside a task spawned
/// through [`crate::Scheduler::spawn`], exactly as the original `current()`
/// is documented to do when called off-Task.
pub fn current() -> Frame {
    CURRENT_FRAME.try_with(Clone::clone).expect("mgmt_runtime::current() called outside a spawned task")
}

/// A spawned task's handle (spec §4.1 "Task"). Awaiting [`TaskHandle::join`]
/// blocks the caller until the task finishes, isolating a panicking task's
/// unwind to this handle rather than the whole process — spec §4.1 treats a
/// panicking Task as a fatal programming error, but crashing the node on a
/// single bad collaborator is worse for a cluster coordinator than failing
/// the one transaction that triggered it (see SPEC_FULL.md §4.1).
pub struct TaskHandle<T> {
    inner: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(inner: JoinHandle<T>) -> Self {
        Self { inner }
    }

    pub async fn join(self) -> Result<T, RuntimeError> {
        match self.inner.await {
            Ok(value) => Ok(value),
            Err(join_err) if join_err.is_cancelled() => Err(RuntimeError::TaskCancelled),
            Err(join_err) => Err(RuntimeError::TaskPanicked(join_err.to_string())),
        }
    }

    /// Requests cancellation without waiting for the task to stop.
    pub fn abort(&self) {
        self.inner.abort();
    }
}

/// Runs `frame` as the task-local [`Frame`] for the duration of `fut`, used
/// by [`crate::Scheduler::spawn`] to set up `current()` inside the spawned
/// future before tokio polls it.
pub(crate) async fn with_frame<F: Future>(frame: Frame, fut: F) -> F::Output {
    CURRENT_FRAME.scope(frame, fut).await
}
