use std::future::Future;

use mgmt_config::RuntimeConfig;
use tokio::runtime::{Builder, Runtime};

use crate::error::RuntimeError;
use crate::frame::Frame;
use crate::task::{with_frame, TaskHandle};

/// The cooperative task runtime (spec §4.1 "Scheduler"), rendered on top of
/// a multi-threaded tokio runtime rather than the original's single-threaded
/// run-queue with explicit yield/suspend/wake-on-event transitions — tokio's
/// task scheduler already implements that state machine, and SPEC_FULL.md
/// §4.1 permits the collapse. `spawn` still produces the same externally
/// observable contract: a handle the caller can join, a `current()` the
/// spawned body can call, and failure isolated per task.
pub struct Scheduler {
    runtime: Runtime,
}

impl Scheduler {
    pub fn new(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all();
        if let Some(worker_threads) = config.worker_threads {
            builder.worker_threads(worker_threads);
        }
        let runtime = builder.build().map_err(|err| RuntimeError::OutOfResources(err.to_string()))?;
        Ok(Self { runtime })
    }

    /// Spawns `fut` as a new Task carrying `frame` as its identity (spec
    /// §4.1 `spawn(fn, frame)`). The returned handle must be joined for the
    /// task's result and for any panic inside it to surface.
    pub fn spawn<F>(&self, frame: Frame, fut: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        TaskHandle::new(self.runtime.spawn(with_frame(frame, fut)))
    }

    /// Blocks the calling native thread on `fut`, entering the scheduler's
    /// runtime context. Used by entry points that are not themselves async
    /// (spec §6 synchronous collaborator boundary).
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    pub fn handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mgmt_common::{OperationCode, Uuid};

    use super::*;
    use crate::task::current;

    fn test_frame() -> Frame {
        Frame::new(Uuid::new_v4(), OperationCode::new("SNAPSHOT_CREATE"))
    }

    #[test]
    fn spawned_task_observes_its_own_frame() {
        let scheduler = Scheduler::new(&RuntimeConfig::default()).unwrap();
        let frame = test_frame();
        let expected = frame.clone();

        let result = scheduler.block_on(async {
            let handle = scheduler.spawn(frame, async { current() });
            handle.join().await.unwrap()
        });

        assert_eq!(result, expected);
    }

    #[test]
    fn panicking_task_surfaces_as_task_panicked() {
        let scheduler = Scheduler::new(&RuntimeConfig::default()).unwrap();
        let result = scheduler.block_on(async {
            let handle = scheduler.spawn(test_frame(), async { panic!("collaborator exploded") });
            handle.join().await
        });

        assert_matches!(result, Err(RuntimeError::TaskPanicked(_)));
    }

    #[test]
    fn aborted_task_surfaces_as_task_cancelled() {
        let scheduler = Scheduler::new(&RuntimeConfig::default()).unwrap();
        let result = scheduler.block_on(async {
            let handle = scheduler.spawn(test_frame(), async {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            });
            handle.abort();
            handle.join().await
        });

        assert_matches!(result, Err(RuntimeError::TaskCancelled));
    }

    #[test]
    #[should_panic(expected = "called outside a spawned task")]
    fn current_outside_task_panics() {
        let _ = current();
    }
}
