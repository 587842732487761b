use std::sync::{Condvar, Mutex};

use tokio::sync::Notify;

use crate::error::RuntimeError;

/// K-wake synchronization gate (spec §3 "Barrier", §4.2).
///
/// Created with a positive `count`. Each `wake()` decrements the remaining
/// count; a waiter blocks until it reaches zero. Waking past zero is a
/// programming error (spec §3 invariant 2) and returns
/// [`RuntimeError::BarrierOveruse`] instead of panicking the caller, so the
/// dispatch engine can turn it into a transaction failure rather than
/// crashing the node.
///
/// Two wait flavors are provided: [`Barrier::wait`] for callers running
/// inside the async scheduler, and [`Barrier::wait_blocking`] for native
/// threads (e.g. test harnesses, or collaborators spec §6 describes as
/// synchronous). Both share the same `remaining` counter.
pub struct Barrier {
    remaining: Mutex<i64>,
    condvar: Condvar,
    notify: Notify,
}

impl Barrier {
    pub fn new(count: u32) -> Self {
        Self { remaining: Mutex::new(count as i64), condvar: Condvar::new(), notify: Notify::new() }
    }

    /// Decrements the remaining count by one and wakes any waiter once it
    /// reaches zero.
    pub fn wake(&self) -> Result<(), RuntimeError> {
        let mut remaining = self.remaining.lock().expect("barrier mutex poisoned");
        if *remaining <= 0 {
            debug_assert!(false, "barrier woken more times than its initial count");
            return Err(RuntimeError::BarrierOveruse);
        }
        *remaining -= 1;
        if *remaining == 0 {
            self.condvar.notify_all();
            self.notify.notify_one();
        }
        Ok(())
    }

    /// Blocks the calling async task until `wake()` has been called `count`
    /// times. Uses `notify_one()` rather than `notify_waiters()`: a permit
    /// stored by `notify_one()` is picked up by the next `notified().await`
    /// even if no one was waiting yet, whereas `notify_waiters()` only wakes
    /// futures already polled and would lose a wake that races ahead of the
    /// wait.
    pub async fn wait(&self) {
        loop {
            if self.is_satisfied() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_satisfied() {
                return;
            }
            notified.await;
        }
    }

    /// Blocks the calling native thread until `wake()` has been called
    /// `count` times (spec §4.2 synchronous collaborator path).
    pub fn wait_blocking(&self) {
        let guard = self.remaining.lock().expect("barrier mutex poisoned");
        let _guard = self.condvar.wait_while(guard, |remaining| *remaining > 0).expect("barrier mutex poisoned");
    }

    fn is_satisfied(&self) -> bool {
        *self.remaining.lock().expect("barrier mutex poisoned") <= 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn wait_returns_once_count_reached() {
        let barrier = Arc::new(Barrier::new(3));
        let waiter = tokio::spawn({
            let barrier = barrier.clone();
            async move {
                barrier.wait().await;
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        barrier.wake().unwrap();
        barrier.wake().unwrap();
        assert!(!waiter.is_finished());
        barrier.wake().unwrap();

        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn wake_past_initial_count_is_overuse() {
        let barrier = Barrier::new(1);
        barrier.wake().unwrap();
        assert_matches!(barrier.wake(), Err(RuntimeError::BarrierOveruse));
    }

    #[test]
    fn wait_blocking_returns_once_count_reached() {
        let barrier = Arc::new(Barrier::new(2));
        let handle = std::thread::spawn({
            let barrier = barrier.clone();
            move || barrier.wait_blocking()
        });

        std::thread::sleep(Duration::from_millis(10));
        barrier.wake().unwrap();
        barrier.wake().unwrap();
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn zero_count_barrier_is_immediately_satisfied() {
        let barrier = Barrier::new(0);
        tokio::time::timeout(Duration::from_millis(50), barrier.wait()).await.unwrap();
    }
}
