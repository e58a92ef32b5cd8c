use std::sync::Arc;
use std::time::Duration;

use chain::{FastChainReader, FruitPool, SnailChainReader, TxPool};
use containers::{SnailBlock, Transaction};
use parking_lot::Mutex;
/// Sync service wiring the relay and syncer loops.
///
/// The SyncService is the entry point of the sync engine. It owns:
/// - Two PackRelay loops: pending transactions and fruits for new peers
/// - The syncer loop: periodic and new-peer triggered sync attempts
/// - The shutdown signal shared by every loop
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use super::{
    config::{SyncConfig, NEW_PEER_CHANNEL_SIZE},
    downloader::{Broadcaster, Downloader, FastDownloader, Fetcher},
    flags::SyncFlags,
    relay::{PackRelay, PeerPicker, RandomPicker, RelayHandle},
    states::SyncOutcome,
    synchroniser::Synchroniser,
};
use crate::peer::{Peer, PeerSet};

/// Everything the sync engine talks to.
#[derive(Clone)]
pub struct SyncCollaborators {
    pub peers: Arc<dyn PeerSet>,
    pub tx_pool: Arc<dyn TxPool>,
    pub fruit_pool: Arc<dyn FruitPool>,
    pub snail_chain: Arc<dyn SnailChainReader>,
    pub fast_chain: Arc<dyn FastChainReader>,
    pub snail_downloader: Arc<dyn Downloader>,
    pub fast_downloader: Arc<dyn FastDownloader>,
    pub snail_fetcher: Arc<dyn Fetcher>,
    pub fast_fetcher: Arc<dyn Fetcher>,
    pub broadcaster: Arc<dyn Broadcaster>,
}

/// Loops created by `new` and moved into tasks by `spawn`.
struct Loops {
    tx_relay: PackRelay<Transaction>,
    fruit_relay: PackRelay<SnailBlock>,
    new_peer: mpsc::Receiver<()>,
}

pub struct SyncService {
    config: SyncConfig,
    peers: Arc<dyn PeerSet>,
    tx_pool: Arc<dyn TxPool>,
    fruit_pool: Arc<dyn FruitPool>,
    snail_fetcher: Arc<dyn Fetcher>,
    fast_fetcher: Arc<dyn Fetcher>,
    synchroniser: Arc<Synchroniser>,
    tx_relay: RelayHandle<Transaction>,
    fruit_relay: RelayHandle<SnailBlock>,
    new_peer: mpsc::Sender<()>,
    loops: Mutex<Option<Loops>>,
    shutdown: broadcast::Sender<()>,
}

impl SyncService {
    pub fn new(config: SyncConfig, collaborators: SyncCollaborators) -> Self {
        Self::with_pickers(config, collaborators, RandomPicker, RandomPicker)
    }

    /// Like [`Self::new`], with explicit peer selection policies for the
    /// transaction and fruit relays.
    pub fn with_pickers(
        config: SyncConfig,
        collaborators: SyncCollaborators,
        tx_picker: impl PeerPicker,
        fruit_picker: impl PeerPicker,
    ) -> Self {
        let flags = Arc::new(SyncFlags::new(config.fast_sync));
        let synchroniser = Arc::new(Synchroniser::new(
            collaborators.snail_chain,
            collaborators.fast_chain,
            collaborators.snail_downloader,
            collaborators.fast_downloader,
            collaborators.broadcaster,
            flags,
            config.max_fast_sync_window,
        ));

        let (tx_relay, tx_handle) = PackRelay::new(config.tx_pack_size, tx_picker);
        let (fruit_relay, fruit_handle) = PackRelay::new(config.fruit_pack_size, fruit_picker);
        let (new_peer_tx, new_peer_rx) = mpsc::channel(NEW_PEER_CHANNEL_SIZE);
        let (shutdown, _) = broadcast::channel(1);

        Self {
            config,
            peers: collaborators.peers,
            tx_pool: collaborators.tx_pool,
            fruit_pool: collaborators.fruit_pool,
            snail_fetcher: collaborators.snail_fetcher,
            fast_fetcher: collaborators.fast_fetcher,
            synchroniser,
            tx_relay: tx_handle,
            fruit_relay: fruit_handle,
            new_peer: new_peer_tx,
            loops: Mutex::new(Some(Loops {
                tx_relay,
                fruit_relay,
                new_peer: new_peer_rx,
            })),
            shutdown,
        }
    }

    pub fn flags(&self) -> &Arc<SyncFlags> {
        self.synchroniser.flags()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Hand the pending pools to a newly connected peer and signal the syncer.
    pub async fn on_peer_connected(&self, peer: Arc<dyn Peer>) {
        let id = peer.id();
        let transactions: Vec<Transaction> = self.tx_pool.pending().into_values().flatten().collect();
        let fruits = self.fruit_pool.pending_fruits();
        debug!(peer = %id, transactions = transactions.len(), fruits = fruits.len(), "Peer connected");

        let mut shutdown = self.shutdown.subscribe();
        tokio::select! {
            _ = async {
                self.tx_relay.relay(Arc::clone(&peer), transactions).await;
                self.fruit_relay.relay(peer, fruits).await;
            } => {}
            _ = shutdown.recv() => return,
        }

        // A full buffer already holds a pending trigger.
        let _ = self.new_peer.try_send(());
    }

    /// Run one attempt against the current best peer, on the caller's task.
    pub async fn synchronise_now(&self) -> SyncOutcome {
        self.synchroniser.synchronise(self.peers.best_peer()).await
    }

    /// Spawn the relay and syncer loops. Only the first call spawns anything.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let Some(loops) = self.loops.lock().take() else {
            warn!("Sync service already spawned");
            return Vec::new();
        };

        let syncer = Syncer {
            synchroniser: Arc::clone(&self.synchroniser),
            peers: Arc::clone(&self.peers),
            snail_fetcher: Arc::clone(&self.snail_fetcher),
            fast_fetcher: Arc::clone(&self.fast_fetcher),
            min_peers: self.config.min_desired_peer_count,
            cycle: self.config.force_sync_cycle(),
        };

        info!(
            cycle_ms = self.config.force_sync_cycle_ms,
            min_peers = self.config.min_desired_peer_count,
            fast_sync = self.config.fast_sync,
            "Starting sync service"
        );
        vec![
            tokio::spawn(loops.tx_relay.run(self.shutdown.subscribe())),
            tokio::spawn(loops.fruit_relay.run(self.shutdown.subscribe())),
            tokio::spawn(syncer.run(loops.new_peer, self.shutdown.subscribe())),
        ]
    }

    /// Signal every loop to exit.
    pub fn shutdown(&self) {
        info!("Stopping sync service");
        let _ = self.shutdown.send(());
    }
}

struct Syncer {
    synchroniser: Arc<Synchroniser>,
    peers: Arc<dyn PeerSet>,
    snail_fetcher: Arc<dyn Fetcher>,
    fast_fetcher: Arc<dyn Fetcher>,
    min_peers: usize,
    cycle: Duration,
}

impl Syncer {
    async fn run(self, mut new_peer: mpsc::Receiver<()>, mut shutdown: broadcast::Receiver<()>) {
        self.snail_fetcher.start();
        self.fast_fetcher.start();

        let mut force_sync = interval_at(Instant::now() + self.cycle, self.cycle);

        loop {
            tokio::select! {
                Some(()) = new_peer.recv() => {
                    if self.peers.len() >= self.min_peers {
                        self.spawn_attempt("new peer");
                    }
                }
                _ = force_sync.tick() => self.spawn_attempt("force sync"),
                _ = shutdown.recv() => break,
            }
        }

        self.snail_fetcher.stop();
        self.fast_fetcher.stop();
        self.synchroniser.terminate();
        debug!("Syncer loop stopped");
    }

    fn spawn_attempt(&self, trigger: &'static str) {
        let peer = self.peers.best_peer();
        let synchroniser = Arc::clone(&self.synchroniser);
        tokio::spawn(async move {
            let outcome = synchroniser.synchronise(peer).await;
            debug!(trigger, ?outcome, "Sync attempt finished");
        });
    }
}
