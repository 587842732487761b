//! End-to-end dispatch scenarios (spec §8 A-C): a real `LockService` and
//! `Roster`, a `ScriptedChannel` standing in for two remote peers, and
//! always-succeeding local collaborators — the originator's own callbacks
//! are never the ones under test here, the peers' scripted replies are.

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use mgmt_common::{keys, CoordinatorError, Dict, EntityType, OperationCode, Uuid};
use mgmt_config::{DispatchConfig, RuntimeConfig};
use mgmt_dispatch::DispatchEngine;
use mgmt_lock::LockService;
use mgmt_roster::{Peer, Roster};
use mgmt_runtime::Scheduler;
use mgmt_rpc::{
    BrickOpFn, BrickOpPhase, CommitFn, PostValidateFn, PreValidateFn, RpcChannel, RpcError, RpcRequest, RpcResponse,
    Scripted, ScriptedChannel,
};
use serde_json::json;

struct AlwaysOk;

#[async_trait]
impl PreValidateFn for AlwaysOk {
    async fn pre_validate(&self, _op: &OperationCode, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        Ok(Dict::new())
    }
}

#[async_trait]
impl BrickOpFn for AlwaysOk {
    async fn brick_op(&self, _phase: BrickOpPhase, _op: &OperationCode, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        Ok(Dict::new())
    }
}

#[async_trait]
impl CommitFn for AlwaysOk {
    async fn commit(&self, _op: &OperationCode, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        Ok(Dict::new())
    }
}

#[async_trait]
impl PostValidateFn for AlwaysOk {
    async fn post_validate(&self, _op: &OperationCode, _op_ret: i32, _dict: &Dict) -> Result<Dict, CoordinatorError> {
        Ok(Dict::new())
    }
}

fn snap_create_dict() -> Dict {
    let mut dict = Dict::new();
    dict.insert("snapname", json!("s1"));
    dict.insert(keys::count(EntityType::Volume), json!(1));
    dict.insert(keys::name(EntityType::Volume, 1), json!("v1"));
    dict
}

fn befriended_peer(uuid: Uuid) -> Peer {
    Peer { uuid, hostname: uuid.to_string(), connected: true, friendship: true, generation: 0 }
}

async fn build_engine(roster: Arc<Roster>, channel: Arc<dyn RpcChannel>) -> (DispatchEngine, Arc<LockService>) {
    let config = DispatchConfig::default();
    let lock_service = Arc::new(LockService::new(&config.lock_service));
    let runtime = Arc::new(Scheduler::new(&RuntimeConfig::default()).unwrap());
    let engine = DispatchEngine::new(
        runtime,
        lock_service.clone(),
        roster,
        channel,
        Arc::new(AlwaysOk),
        Arc::new(AlwaysOk),
        Arc::new(AlwaysOk),
        Arc::new(AlwaysOk),
        config,
    );
    (engine, lock_service)
}

#[tokio::test]
async fn scenario_a_successful_snapshot_create_over_three_peers() {
    let roster = Arc::new(Roster::new());
    let p2 = Uuid::new_v4();
    let p3 = Uuid::new_v4();
    roster.upsert(befriended_peer(p2)).await;
    roster.upsert(befriended_peer(p3)).await;

    let channel = Arc::new(ScriptedChannel::new());
    for peer in [p2, p3] {
        let replies = (0..7).map(|_| Scripted::Reply(RpcResponse::ok(peer, Dict::new()))).collect();
        channel.script(peer, replies).await;
    }

    let originator = Uuid::new_v4();
    let (engine, lock_service) = build_engine(roster, channel).await;
    let result = engine.execute(OperationCode::new("SNAP_CREATE"), snap_create_dict(), originator).await.unwrap();

    assert_eq!(result.op_ret, 0);
    assert_eq!(result.op_errstr, "");
    assert!(lock_service.held_locks_snapshot().await.is_empty());
}

#[tokio::test]
async fn scenario_b_pre_validate_fails_on_one_peer() {
    let roster = Arc::new(Roster::new());
    let p2 = Uuid::new_v4();
    let p3 = Uuid::new_v4();
    roster.upsert(befriended_peer(p2)).await;
    roster.upsert(befriended_peer(p3)).await;

    let channel = Arc::new(ScriptedChannel::new());
    // P2's pre-validate succeeds, but the shared gate still closes because
    // P3 fails, so neither peer ever receives brick-op/commit — only the
    // cleanup post-validate and the unconditional unlock.
    channel
        .script(
            p2,
            vec![
                Scripted::Reply(RpcResponse::ok(p2, Dict::new())),
                Scripted::Reply(RpcResponse::ok(p2, Dict::new())),
                Scripted::Reply(RpcResponse::ok(p2, Dict::new())),
                Scripted::Reply(RpcResponse::ok(p2, Dict::new())),
            ],
        )
        .await;
    channel
        .script(
            p3,
            vec![
                Scripted::Reply(RpcResponse::ok(p3, Dict::new())),
                Scripted::Reply(RpcResponse::failure(p3, 255, "quota exceeded")),
                Scripted::Reply(RpcResponse::ok(p3, Dict::new())),
                Scripted::Reply(RpcResponse::ok(p3, Dict::new())),
            ],
        )
        .await;

    let originator = Uuid::new_v4();
    let (engine, lock_service) = build_engine(roster, channel).await;
    let result = engine.execute(OperationCode::new("SNAP_CREATE"), snap_create_dict(), originator).await.unwrap();

    assert_ne!(result.op_ret, 0);
    assert!(result.op_errstr.contains("quota exceeded"), "errstr was: {}", result.op_errstr);
    assert!(lock_service.held_locks_snapshot().await.is_empty());
}

/// Wraps a [`ScriptedChannel`] and flips one peer to disconnected in the
/// roster the instant its `Lock` reply comes back — modelling "the
/// connection drops between lockdown and pre-validate" deterministically,
/// without racing against `execute()`'s own task.
struct DisconnectAfterLock {
    inner: ScriptedChannel,
    roster: Arc<Roster>,
    drop_after_lock: Uuid,
}

#[async_trait]
impl RpcChannel for DisconnectAfterLock {
    async fn call(&self, peer: Uuid, request: RpcRequest) -> Result<RpcResponse, RpcError> {
        let is_lock = matches!(request, RpcRequest::Lock { .. });
        let reply = self.inner.call(peer, request).await;
        if peer == self.drop_after_lock && is_lock {
            let mut disconnected = self.roster.get(peer).await.expect("peer must be in roster");
            disconnected.connected = false;
            self.roster.upsert(disconnected).await;
        }
        reply
    }
}

#[tokio::test]
async fn scenario_c_peer_disconnects_before_pre_validate() {
    let roster = Arc::new(Roster::new());
    let p2 = Uuid::new_v4();
    let p3 = Uuid::new_v4();
    roster.upsert(befriended_peer(p2)).await;
    roster.upsert(befriended_peer(p3)).await;

    let inner = ScriptedChannel::new();
    // P2 sees the full happy path: lock, pre-validate, brick-op-pre,
    // commit, brick-op-post, post-validate, unlock.
    let p2_replies = (0..7).map(|_| Scripted::Reply(RpcResponse::ok(p2, Dict::new()))).collect();
    inner.script(p2, p2_replies).await;
    // P3 only ever answers the lock call; it is excluded from every
    // subsequent phase once disconnected, but still receives (and fails) an
    // unlock attempt, which the engine must tolerate.
    inner.script(p3, vec![Scripted::Reply(RpcResponse::ok(p3, Dict::new())), Scripted::Fail(RpcError::WouldBlock)]).await;
    let channel = Arc::new(DisconnectAfterLock { inner, roster: roster.clone(), drop_after_lock: p3 });

    let originator = Uuid::new_v4();
    let (engine, lock_service) = build_engine(roster, channel).await;

    let result = engine.execute(OperationCode::new("SNAP_CREATE"), snap_create_dict(), originator).await.unwrap();

    assert_eq!(result.op_ret, 0, "errstr was: {}", result.op_errstr);
    assert!(lock_service.held_locks_snapshot().await.is_empty());
}

#[tokio::test]
async fn malformed_input_is_rejected_before_any_lock_is_taken() {
    let roster = Arc::new(Roster::new());
    let channel = Arc::new(ScriptedChannel::new());
    let (engine, lock_service) = build_engine(roster, channel).await;

    let mut dict = Dict::new();
    dict.insert(keys::count(EntityType::Volume), json!(1));
    // volname1 is missing.

    let result = engine.execute(OperationCode::new("SNAP_CREATE"), dict, Uuid::new_v4()).await;

    assert_matches!(result, Err(mgmt_dispatch::DispatchError::MalformedInput(_)));
    assert!(lock_service.held_locks_snapshot().await.is_empty());
}
