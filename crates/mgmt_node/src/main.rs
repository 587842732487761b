//! Wiring binary: builds a `DispatchEngine` over a `LocalLoopbackChannel`
//! with two demo peers and runs one administrative operation through it
//! end to end, the way `apollo_infra`'s bin targets smoke-test a component
//! wiring before a real deployment config is plugged in.

mod demo;

use std::sync::Arc;

use mgmt_common::{keys, Dict, EntityType, OperationCode, Uuid};
use mgmt_config::{DispatchConfig, RuntimeConfig};
use mgmt_dispatch::DispatchEngine;
use mgmt_lock::LockService;
use mgmt_roster::{Peer, Roster};
use mgmt_rpc::LocalLoopbackChannel;
use mgmt_runtime::Scheduler;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::demo::{DemoCollaborators, DemoPeer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = DispatchConfig::default();
    let roster = Arc::new(Roster::new());
    let channel = Arc::new(LocalLoopbackChannel::new(config.rpc.channel_capacity));
    let runtime = Arc::new(Scheduler::new(&RuntimeConfig::default()).expect("task runtime starts"));

    let originator = Uuid::new_v4();
    for _ in 0..2 {
        let peer_uuid = Uuid::new_v4();
        roster
            .upsert(Peer { uuid: peer_uuid, hostname: format!("peer-{peer_uuid}"), connected: true, friendship: true, generation: 0 })
            .await;
        channel.register_peer(peer_uuid, Arc::new(DemoPeer { uuid: peer_uuid })).await;
    }

    let lock_service = Arc::new(LockService::new(&config.lock_service));
    let engine = DispatchEngine::new(
        runtime,
        lock_service,
        roster,
        channel,
        Arc::new(DemoCollaborators),
        Arc::new(DemoCollaborators),
        Arc::new(DemoCollaborators),
        Arc::new(DemoCollaborators),
        config,
    );

    let mut input = Dict::new();
    input.insert("snapname", json!("demo-snapshot"));
    input.insert(keys::count(EntityType::Volume), json!(1));
    input.insert(keys::name(EntityType::Volume, 1), json!("demo-volume"));

    let result = engine.execute(OperationCode::new("SNAP_CREATE"), input, originator).await.expect("well-formed demo input");

    tracing::info!(op_ret = result.op_ret, op_errno = result.op_errno, op_errstr = %result.op_errstr, "transaction complete");
}
