//! Peer roster and generation counter (spec §4.6).
//!
//! The roster is read-mostly: every fan-out operation reads it once per
//! transaction to snapshot the eligible peer set, while adds/removes are
//! rare administrative events. `RwLock` read guards are non-exclusive, so
//! concurrent transactions never block each other just to look up peers.

mod peer;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use mgmt_common::Uuid;
use tokio::sync::RwLock;

pub use peer::Peer;

/// Peer roster and generation counter.
///
/// The generation counter is bumped *before* the peer record for an
/// add/remove is written, so a transaction that reads the counter and then
/// the peer map always observes a generation at or behind what it already
/// recorded — never ahead — which is what makes the `generation <=
/// saved_roster_generation` eligibility rule (spec §4.5, §4.6) sound.
pub struct Roster {
    peers: RwLock<HashMap<Uuid, Peer>>,
    generation: AtomicU64,
}

impl Roster {
    pub fn new() -> Self {
        Self { peers: RwLock::new(HashMap::new()), generation: AtomicU64::new(0) }
    }

    /// The current global generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Adds or replaces a peer, stamping it with the post-increment
    /// generation so its own `generation` field reflects the event that
    /// introduced or last touched it.
    pub async fn upsert(&self, mut peer: Peer) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        peer.generation = generation;
        self.peers.write().await.insert(peer.uuid, peer);
    }

    pub async fn remove(&self, uuid: Uuid) -> Option<Peer> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.peers.write().await.remove(&uuid)
    }

    pub async fn get(&self, uuid: Uuid) -> Option<Peer> {
        self.peers.read().await.get(&uuid).cloned()
    }

    /// Snapshots every peer eligible for a fan-out issued against
    /// `saved_roster_generation`: connected, and not newer than the
    /// transaction's own view of the roster (spec §4.5 "Eligibility
    /// filter"). `relax_friendship` lifts the friendship requirement for
    /// operations like `SYNC_VOLUME` (`OperationCode::relaxes_friendship_filter`).
    pub async fn eligible_peers(&self, saved_roster_generation: u64, relax_friendship: bool) -> Vec<Peer> {
        self.peers
            .read()
            .await
            .values()
            .filter(|peer| peer.connected)
            .filter(|peer| peer.generation <= saved_roster_generation)
            .filter(|peer| relax_friendship || peer.friendship)
            .cloned()
            .collect()
    }

    pub async fn all_peers(&self) -> Vec<Peer> {
        self.peers.read().await.values().cloned().collect()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}
