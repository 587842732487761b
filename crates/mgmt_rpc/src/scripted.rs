use std::collections::HashMap;

use async_trait::async_trait;
use mgmt_common::Uuid;
use tokio::sync::Mutex;

use crate::channel::RpcChannel;
use crate::error::RpcError;
use crate::messages::{RpcRequest, RpcResponse};

/// A canned response, queued per peer, for the scenario tests of spec §8.
/// `Scripted::Fail` lets a test inject a `Transport`/`WouldBlock` failure
/// without standing up a real peer.
pub enum Scripted {
    Reply(RpcResponse),
    Fail(RpcError),
}

/// A test-only `RpcChannel` that replays a queue of canned responses per
/// peer, one per call, regardless of which wire message was sent — the
/// scenario tests script the sequence of phases themselves and only need to
/// control each phase's outcome.
#[derive(Default)]
pub struct ScriptedChannel {
    queues: Mutex<HashMap<Uuid, Vec<Scripted>>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self { queues: Mutex::new(HashMap::new()) }
    }

    /// Queues `script` for `peer`, consumed in order as that peer's calls
    /// arrive. Use [`Vec::pop`] ordering under the hood: enqueue in call
    /// order, not reverse.
    pub async fn script(&self, peer: Uuid, mut script: Vec<Scripted>) {
        script.reverse();
        self.queues.lock().await.insert(peer, script);
    }
}

#[async_trait]
impl RpcChannel for ScriptedChannel {
    async fn call(&self, peer: Uuid, _request: RpcRequest) -> Result<RpcResponse, RpcError> {
        let mut queues = self.queues.lock().await;
        let queue = queues
            .get_mut(&peer)
            .ok_or_else(|| RpcError::Transport { peer, detail: "no script queued for peer".into() })?;
        match queue.pop() {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(err)) => Err(err),
            None => Err(RpcError::Transport { peer, detail: "script exhausted".into() }),
        }
    }
}
