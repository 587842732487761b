use mgmt_common::Uuid;
use mgmt_rpc::{RpcChannel, RpcError, RpcRequest, RpcResponse};

/// The outcome of applying one operation across a set of targets (spec
/// §4.4 "cluster-syncop"). `replies` is indexed exactly like `targets`: a
/// slot is `None` where the target was not selected, wiped to that state
/// before the fan-out starts, and filled only once its call completes —
/// never partially, and never in completion order.
pub struct FanOutOutcome {
    pub replies: Vec<Option<Result<RpcResponse, RpcError>>>,
    pub success_count: usize,
}

impl FanOutOutcome {
    fn new(len: usize) -> Self {
        Self { replies: (0..len).map(|_| None).collect(), success_count: 0 }
    }

    fn record(&mut self, index: usize, result: Result<RpcResponse, RpcError>) {
        if matches!(&result, Ok(response) if response.is_ok()) {
            self.success_count += 1;
        }
        self.replies[index] = Some(result);
    }
}

fn selected_indices(selected: &[bool]) -> Vec<usize> {
    selected.iter().enumerate().filter(|(_, &is_selected)| is_selected).map(|(index, _)| index).collect()
}

/// Parallel ("on-list") fan-out: dispatches to every selected target
/// concurrently, then waits for all of them — the Barrier-for-N-wakeups of
/// spec §4.4 collapses to `futures::future::join_all` awaiting every
/// in-flight call at once.
pub async fn fan_out_parallel(
    channel: &dyn RpcChannel,
    targets: &[Uuid],
    selected: &[bool],
    request_for: impl Fn(usize, Uuid) -> RpcRequest,
) -> FanOutOutcome {
    let indices = selected_indices(selected);
    let calls = indices.iter().map(|&index| channel.call(targets[index], request_for(index, targets[index])));
    let results = futures::future::join_all(calls).await;

    let mut outcome = FanOutOutcome::new(targets.len());
    for (index, result) in indices.into_iter().zip(results) {
        outcome.record(index, result);
    }
    outcome
}

/// Sequential fan-out: one target at a time, waiting for its reply before
/// moving to the next. Used as the fallback when optimistic parallel
/// locking hit `WouldBlock` on any target.
pub async fn fan_out_sequential(
    channel: &dyn RpcChannel,
    targets: &[Uuid],
    selected: &[bool],
    request_for: impl Fn(usize, Uuid) -> RpcRequest,
) -> FanOutOutcome {
    let mut outcome = FanOutOutcome::new(targets.len());
    for index in selected_indices(selected) {
        let result = channel.call(targets[index], request_for(index, targets[index])).await;
        outcome.record(index, result);
    }
    outcome
}
