/// Peer handles as seen by the sync engine.
///
/// The transport owns the connections; the sync engine only needs a peer's
/// identity, its advertised head and a way to push pending items to it.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use containers::{Hash, SnailBlock, TotalDifficulty, Transaction};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::PeerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("peer {0} is disconnected")]
    Disconnected(PeerId),
    #[error("peer {0} is already registered")]
    AlreadyRegistered(PeerId),
    #[error("send to peer {peer} failed: {reason}")]
    SendFailed { peer: PeerId, reason: String },
}

/// A connected remote node.
#[async_trait]
pub trait Peer: Send + Sync {
    fn id(&self) -> PeerId;

    /// Hash and total difficulty of the snail chain head the peer advertised.
    fn head(&self) -> (Hash, TotalDifficulty);

    async fn send_transactions(&self, transactions: Vec<Transaction>) -> Result<(), PeerError>;

    async fn send_fruits(&self, fruits: Vec<SnailBlock>) -> Result<(), PeerError>;
}

/// The set of currently connected peers.
pub trait PeerSet: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peer advertising the highest total difficulty, if any.
    fn best_peer(&self) -> Option<Arc<dyn Peer>>;
}

/// Connected peers keyed by identity.
#[derive(Default)]
pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, Arc<dyn Peer>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer: Arc<dyn Peer>) -> Result<(), PeerError> {
        let id = peer.id();
        let mut peers = self.peers.write();
        if peers.contains_key(&id) {
            return Err(PeerError::AlreadyRegistered(id));
        }
        peers.insert(id, peer);
        info!(peer = %id, total = peers.len(), "Peer registered");
        Ok(())
    }

    pub fn unregister(&self, id: &PeerId) -> Option<Arc<dyn Peer>> {
        let removed = self.peers.write().remove(id);
        if removed.is_some() {
            debug!(peer = %id, "Peer unregistered");
        }
        removed
    }

    pub fn peer(&self, id: &PeerId) -> Option<Arc<dyn Peer>> {
        self.peers.read().get(id).cloned()
    }

    pub fn peers(&self) -> Vec<Arc<dyn Peer>> {
        self.peers.read().values().cloned().collect()
    }
}

impl PeerSet for PeerRegistry {
    fn len(&self) -> usize {
        self.peers.read().len()
    }

    fn best_peer(&self) -> Option<Arc<dyn Peer>> {
        self.peers
            .read()
            .values()
            .max_by(|a, b| a.head().1.cmp(&b.head().1).then_with(|| b.id().cmp(&a.id())))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    struct StaticPeer {
        id: PeerId,
        td: u64,
    }

    #[async_trait]
    impl Peer for StaticPeer {
        fn id(&self) -> PeerId {
            self.id
        }

        fn head(&self) -> (Hash, TotalDifficulty) {
            (Hash::ZERO, U256::from(self.td))
        }

        async fn send_transactions(&self, _transactions: Vec<Transaction>) -> Result<(), PeerError> {
            Ok(())
        }

        async fn send_fruits(&self, _fruits: Vec<SnailBlock>) -> Result<(), PeerError> {
            Ok(())
        }
    }

    fn peer(index: u64, td: u64) -> Arc<dyn Peer> {
        Arc::new(StaticPeer {
            id: PeerId::from_index(index),
            td,
        })
    }

    #[test]
    fn best_peer_has_highest_td() {
        let registry = PeerRegistry::new();
        assert!(registry.best_peer().is_none());

        registry.register(peer(1, 100)).unwrap();
        registry.register(peer(2, 300)).unwrap();
        registry.register(peer(3, 200)).unwrap();

        assert_eq!(registry.best_peer().unwrap().id(), PeerId::from_index(2));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = PeerRegistry::new();
        registry.register(peer(1, 1)).unwrap();
        assert_eq!(
            registry.register(peer(1, 5)).unwrap_err(),
            PeerError::AlreadyRegistered(PeerId::from_index(1))
        );
    }

    #[test]
    fn unregister_removes_peer() {
        let registry = PeerRegistry::new();
        registry.register(peer(1, 1)).unwrap();
        assert!(registry.unregister(&PeerId::from_index(1)).is_some());
        assert!(registry.unregister(&PeerId::from_index(1)).is_none());
        assert!(registry.is_empty());
    }
}
