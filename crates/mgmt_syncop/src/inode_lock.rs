use async_trait::async_trait;
use mgmt_common::Uuid;
use mgmt_rpc::RpcError;
use tracing::info;

/// A peer-addressable lock target: a byte-range lock on an inode, or a
/// name-based entry lock — the target's own implementation captures which.
/// `try_lock` must return immediately with [`RpcError::WouldBlock`] rather
/// than block the caller, so the fan-out helper can detect contention and
/// fall back to the sequential blocking protocol.
#[async_trait]
pub trait LockTarget: Send + Sync {
    async fn try_lock(&self, peer: Uuid) -> Result<(), RpcError>;
    async fn blocking_lock(&self, peer: Uuid) -> Result<(), RpcError>;
    async fn unlock(&self, peer: Uuid) -> Result<(), RpcError>;
}

/// Attempts a non-blocking write-lock on every selected target in parallel.
/// On any `WouldBlock` reply, releases every lock this attempt already took
/// and retries sequentially with the blocking flavour, in target order
/// (spec §4.4 "classical livelock-avoidance protocol"). Returns the final
/// `locked_on` bitmap, indexed like `targets`.
pub async fn try_inode_lock(
    target: &dyn LockTarget,
    targets: &[Uuid],
    selected: &[bool],
) -> Result<Vec<bool>, RpcError> {
    let indices: Vec<usize> = selected.iter().enumerate().filter(|(_, &s)| s).map(|(i, _)| i).collect();

    let attempts = futures::future::join_all(indices.iter().map(|&i| target.try_lock(targets[i]))).await;

    let mut locked_on = vec![false; targets.len()];
    let mut saw_would_block = false;
    for (&index, result) in indices.iter().zip(&attempts) {
        match result {
            Ok(()) => locked_on[index] = true,
            Err(RpcError::WouldBlock) => saw_would_block = true,
            Err(err) => return Err(err.clone()),
        }
    }

    if !saw_would_block {
        return Ok(locked_on);
    }

    info!("inode lock contention detected, releasing and retrying sequentially");
    for &index in &indices {
        if locked_on[index] {
            let _ = target.unlock(targets[index]).await;
            locked_on[index] = false;
        }
    }

    for &index in &indices {
        target.blocking_lock(targets[index]).await?;
        locked_on[index] = true;
    }

    Ok(locked_on)
}

/// The entry-lock analogue of [`try_inode_lock`] (spec §4.4 "Analogous
/// behaviour is defined for entry locks by name rather than by range"):
/// identical contention-retry protocol, over a [`LockTarget`] scoped to a
/// directory entry name instead of an inode byte range.
pub async fn try_entry_lock(
    target: &dyn LockTarget,
    targets: &[Uuid],
    selected: &[bool],
) -> Result<Vec<bool>, RpcError> {
    try_inode_lock(target, targets, selected).await
}
