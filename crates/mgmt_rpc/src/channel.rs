use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mgmt_common::Uuid;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{instrument, trace};

use crate::error::RpcError;
use crate::messages::{RpcRequest, RpcResponse};

/// The "request/response channel abstraction" spec §1/§6 calls out as
/// external: the dispatch engine and `mgmt_syncop` address peers purely by
/// `Uuid` through this trait and never see a transport.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    async fn call(&self, peer: Uuid, request: RpcRequest) -> Result<RpcResponse, RpcError>;
}

/// A peer-side request handler, invoked for every request routed to that
/// peer over a [`LocalLoopbackChannel`]. Mirrors
/// `apollo_infra::component_definitions::ComponentRequestHandler`, generalized
/// from "the one component this client talks to" to "the one peer this
/// envelope was addressed to."
#[async_trait]
pub trait PeerHandler: Send + Sync {
    async fn handle(&self, request: RpcRequest) -> Result<RpcResponse, RpcError>;
}

struct Envelope {
    request: RpcRequest,
    reply: oneshot::Sender<Result<RpcResponse, RpcError>>,
}

/// An in-process `RpcChannel` built from per-peer `tokio::sync::mpsc` round
/// trips, adapted from `apollo_infra`'s `LocalComponentClient` /
/// `LocalComponentServer` pair: a client here sends an envelope and awaits a
/// oneshot reply exactly as the teacher's client awaits its response
/// channel, except the routing key is the peer `Uuid` rather than a single
/// fixed component.
pub struct LocalLoopbackChannel {
    peers: RwLock<HashMap<Uuid, mpsc::Sender<Envelope>>>,
    channel_capacity: usize,
}

impl LocalLoopbackChannel {
    pub fn new(channel_capacity: usize) -> Self {
        Self { peers: RwLock::new(HashMap::new()), channel_capacity }
    }

    /// Registers `handler` to serve requests addressed to `peer`, spawning
    /// the server-side loop (the `request_response_loop` counterpart).
    pub async fn register_peer(&self, peer: Uuid, handler: Arc<dyn PeerHandler>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(self.channel_capacity);
        self.peers.write().await.insert(peer, tx);

        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let response = handler.handle(envelope.request).await;
                let _ = envelope.reply.send(response);
            }
        });
    }

    pub async fn unregister_peer(&self, peer: Uuid) {
        self.peers.write().await.remove(&peer);
    }
}

#[async_trait]
impl RpcChannel for LocalLoopbackChannel {
    #[instrument(skip(self, request), fields(request_label = request.request_label()))]
    async fn call(&self, peer: Uuid, request: RpcRequest) -> Result<RpcResponse, RpcError> {
        let tx = self
            .peers
            .read()
            .await
            .get(&peer)
            .cloned()
            .ok_or_else(|| RpcError::Transport { peer, detail: "peer not registered".into() })?;

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(Envelope { request, reply: reply_tx })
            .await
            .map_err(|_| RpcError::Transport { peer, detail: "peer channel closed".into() })?;

        trace!("awaiting peer reply");
        reply_rx.await.map_err(|_| RpcError::Transport { peer, detail: "peer dropped the reply channel".into() })?
    }
}
