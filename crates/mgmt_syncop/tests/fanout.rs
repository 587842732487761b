use async_trait::async_trait;
use mgmt_common::{Dict, OperationCode, Uuid};
use mgmt_rpc::{RpcChannel, RpcError, RpcRequest, RpcResponse, Scripted, ScriptedChannel};
use mgmt_syncop::{fan_out_parallel, fan_out_sequential, try_inode_lock, LockTarget};
use tokio::sync::Mutex;

fn lock_request(uuid: Uuid) -> RpcRequest {
    RpcRequest::Lock { uuid, op: OperationCode::new("SNAPSHOT_CREATE"), dict: Dict::new() }
}

#[tokio::test]
async fn fan_out_parallel_counts_successes_and_preserves_index_order() {
    let channel = ScriptedChannel::new();
    let targets: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let selected = vec![true, false, true];

    channel.script(targets[0], vec![Scripted::Reply(RpcResponse::ok(targets[0], Dict::new()))]).await;
    channel.script(targets[2], vec![Scripted::Fail(RpcError::Transport { peer: targets[2], detail: "down".into() })]).await;

    let outcome = fan_out_parallel(&channel, &targets, &selected, |_, uuid| lock_request(uuid)).await;

    assert_eq!(outcome.success_count, 1);
    assert!(outcome.replies[0].as_ref().unwrap().is_ok());
    assert!(outcome.replies[1].is_none());
    assert!(outcome.replies[2].as_ref().unwrap().is_err());
}

#[tokio::test]
async fn fan_out_sequential_visits_selected_targets_in_order() {
    let channel = ScriptedChannel::new();
    let targets: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
    let selected = vec![true, true];

    for target in &targets {
        channel.script(*target, vec![Scripted::Reply(RpcResponse::ok(*target, Dict::new()))]).await;
    }

    let outcome = fan_out_sequential(&channel, &targets, &selected, |_, uuid| lock_request(uuid)).await;
    assert_eq!(outcome.success_count, 2);
}

struct ScriptedLockTarget {
    would_block_once: Mutex<std::collections::HashSet<Uuid>>,
    unlocked: Mutex<Vec<Uuid>>,
    blocking_calls: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl LockTarget for ScriptedLockTarget {
    async fn try_lock(&self, peer: Uuid) -> Result<(), RpcError> {
        if self.would_block_once.lock().await.contains(&peer) {
            Err(RpcError::WouldBlock)
        } else {
            Ok(())
        }
    }

    async fn blocking_lock(&self, peer: Uuid) -> Result<(), RpcError> {
        self.blocking_calls.lock().await.push(peer);
        Ok(())
    }

    async fn unlock(&self, peer: Uuid) -> Result<(), RpcError> {
        self.unlocked.lock().await.push(peer);
        Ok(())
    }
}

/// Scenario F: contention on one of three replicas forces a sequential
/// blocking retry across all three, in order.
#[tokio::test]
async fn scenario_f_would_block_triggers_sequential_retry() {
    let target_a = Uuid::new_v4();
    let target_b = Uuid::new_v4();
    let target_c = Uuid::new_v4();
    let targets = vec![target_a, target_b, target_c];
    let selected = vec![true, true, true];

    let lock_target = ScriptedLockTarget {
        would_block_once: Mutex::new([target_b].into_iter().collect()),
        unlocked: Mutex::new(Vec::new()),
        blocking_calls: Mutex::new(Vec::new()),
    };

    let locked_on = try_inode_lock(&lock_target, &targets, &selected).await.unwrap();

    assert_eq!(locked_on, vec![true, true, true]);
    assert_eq!(*lock_target.unlocked.lock().await, vec![target_a, target_c]);
    assert_eq!(*lock_target.blocking_calls.lock().await, vec![target_a, target_b, target_c]);
}
