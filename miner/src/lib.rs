// Snail chain miner lifecycle
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use chain::config::MAXIMUM_EXTRA_DATA_SIZE;
use containers::PublicKey;
use networking::SyncEvent;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub mod election;
pub mod worker;

use election::{CommitteeElection, ElectionEvent, ElectionOption};
use worker::{Agent, Worker};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinerError {
    #[error("extra data exceeds max length: {len} > {max}")]
    ExtraTooLong { len: usize, max: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Start mining once the node is up.
    pub mine: bool,
    pub coinbase: Address,
    /// Mine fruits only, never full snail blocks.
    pub fruit_only: bool,
    /// No committee is ever elected, so election events are not followed.
    pub single_node: bool,
    pub extra: Bytes,
}

/// Gates the worker on sync progress and committee membership.
///
/// `can_start` is owned by the sync event listener and `committee_blocked` by
/// the election listener. Mining runs only while both allow it; a `start`
/// request made while either forbids it is remembered in `should_start`.
pub struct Miner {
    config: MinerConfig,
    worker: Arc<Worker>,
    election: Arc<dyn CommitteeElection>,

    coinbase: RwLock<Address>,
    publickey: RwLock<PublicKey>,
    to_elect: AtomicBool,

    can_start: AtomicBool,
    should_start: AtomicBool,
    committee_blocked: AtomicBool,
    mining: AtomicBool,

    shutdown: broadcast::Sender<()>,
}

impl Miner {
    pub fn new(config: MinerConfig, worker: Arc<Worker>, election: Arc<dyn CommitteeElection>) -> Arc<Self> {
        worker.set_fruit_only(config.fruit_only);
        worker.set_coinbase(config.coinbase);
        let (shutdown, _) = broadcast::channel(1);

        info!(
            coinbase = %config.coinbase,
            fruit_only = config.fruit_only,
            single_node = config.single_node,
            "Miner initialized"
        );
        let miner = Arc::new(Self {
            coinbase: RwLock::new(config.coinbase),
            publickey: RwLock::new(PublicKey::new()),
            to_elect: AtomicBool::new(false),
            can_start: AtomicBool::new(true),
            should_start: AtomicBool::new(false),
            committee_blocked: AtomicBool::new(false),
            mining: AtomicBool::new(false),
            config,
            worker,
            election,
            shutdown,
        });
        if let Err(err) = miner.set_extra(miner.config.extra.clone()) {
            warn!(error = %err, "Ignoring configured extra data");
        }
        miner
    }

    /// Spawn the election listener (unless in single-node mode) and the
    /// one-shot sync event listener.
    pub fn spawn(self: &Arc<Self>, sync_events: broadcast::Receiver<SyncEvent>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(2);
        if !self.config.single_node {
            let election_events = self.election.subscribe_election_event();
            let miner = Arc::clone(self);
            handles.push(tokio::spawn(miner.election_loop(election_events, self.shutdown.subscribe())));
        }
        let miner = Arc::clone(self);
        handles.push(tokio::spawn(miner.update_loop(sync_events, self.shutdown.subscribe())));
        handles
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
        self.stop();
    }

    async fn election_loop(
        self: Arc<Self>,
        mut events: broadcast::Receiver<ElectionEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => self.handle_election_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Election listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = shutdown.recv() => break,
            }
        }
        debug!("Election listener stopped");
    }

    /// Follows the downloader until the first sync finishes, then exits for
    /// good. Later syncs never interrupt mining, so peers cannot stall it by
    /// feeding blocks.
    async fn update_loop(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SyncEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        if self.handle_sync_event(event) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Sync event listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = shutdown.recv() => break,
            }
        }
        debug!("Sync event listener stopped");
    }

    /// Apply a downloader event. Returns `true` on the terminal events, after
    /// which the listener unsubscribes.
    pub fn handle_sync_event(&self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::Started => {
                self.can_start.store(false, Ordering::SeqCst);
                if self.mining() {
                    self.stop();
                    self.should_start.store(true, Ordering::SeqCst);
                    info!("Mining aborted due to sync");
                }
                false
            }
            SyncEvent::Done | SyncEvent::Failed => {
                self.can_start.store(true, Ordering::SeqCst);
                let should_start = self.should_start.swap(false, Ordering::SeqCst);
                info!(?event, should_start, "Sync finished, mining allowed");
                if should_start {
                    self.start(self.coinbase());
                }
                true
            }
        }
    }

    pub fn handle_election_event(&self, event: &ElectionEvent) {
        match event.option {
            ElectionOption::CommitteeStart => {
                let publickey = self.publickey.read().clone();
                if self.election.is_committee_member(&event.members, &publickey) {
                    self.committee_blocked.store(true, Ordering::SeqCst);
                    if self.mining() {
                        self.stop();
                    }
                    info!(committee = event.committee_id, "Joined committee, mining paused");
                } else {
                    debug!(committee = event.committee_id, "Not a committee member, mining continues");
                    self.committee_blocked.store(false, Ordering::SeqCst);
                    self.start(self.coinbase());
                }
            }
            ElectionOption::CommitteeStop => {
                info!(committee = event.committee_id, "Committee stopped, resuming mining");
                self.committee_blocked.store(false, Ordering::SeqCst);
                self.start(self.coinbase());
            }
        }
    }

    /// Request mining with rewards to `coinbase`. Deferred while a sync is
    /// running or the node sits on the committee.
    pub fn start(&self, coinbase: Address) {
        self.should_start.store(true, Ordering::SeqCst);
        self.set_coinbase(coinbase);

        let can_start = self.can_start.load(Ordering::SeqCst);
        let committee_blocked = self.committee_blocked.load(Ordering::SeqCst);
        if !can_start || committee_blocked {
            info!(can_start, committee_blocked, "Mining start deferred");
            return;
        }

        if !self.mining.swap(true, Ordering::SeqCst) {
            info!(coinbase = %coinbase, "Mining started");
        }
        self.worker.start();
        self.worker.commit_new_work();
    }

    pub fn stop(&self) {
        self.worker.stop();
        if self.mining.swap(false, Ordering::SeqCst) {
            info!("Mining stopped");
        }
        self.should_start.store(false, Ordering::SeqCst);
    }

    pub fn register(&self, agent: Arc<dyn Agent>) {
        if self.mining() {
            agent.start();
        }
        self.worker.register(agent);
    }

    pub fn unregister(&self, agent: &Arc<dyn Agent>) {
        self.worker.unregister(agent);
    }

    pub fn mining(&self) -> bool {
        self.mining.load(Ordering::SeqCst)
    }

    pub fn can_start(&self) -> bool {
        self.can_start.load(Ordering::SeqCst)
    }

    pub fn should_start(&self) -> bool {
        self.should_start.load(Ordering::SeqCst)
    }

    pub fn committee_blocked(&self) -> bool {
        self.committee_blocked.load(Ordering::SeqCst)
    }

    pub fn hash_rate(&self) -> u64 {
        self.worker.hash_rate()
    }

    pub fn set_extra(&self, extra: Bytes) -> Result<(), MinerError> {
        if extra.len() > MAXIMUM_EXTRA_DATA_SIZE {
            return Err(MinerError::ExtraTooLong {
                len: extra.len(),
                max: MAXIMUM_EXTRA_DATA_SIZE,
            });
        }
        self.worker.set_extra(extra);
        Ok(())
    }

    pub fn coinbase(&self) -> Address {
        *self.coinbase.read()
    }

    pub fn set_coinbase(&self, coinbase: Address) {
        *self.coinbase.write() = coinbase;
        self.worker.set_coinbase(coinbase);
    }

    /// Set the key used for committee membership checks. An empty key is
    /// ignored.
    pub fn set_election(&self, to_elect: bool, publickey: &[u8]) {
        if publickey.is_empty() {
            info!("Set election failed, public key is empty");
            return;
        }
        let publickey = PublicKey::copy_from_slice(publickey);
        self.to_elect.store(to_elect, Ordering::SeqCst);
        *self.publickey.write() = publickey.clone();
        self.worker.set_election(to_elect, publickey);
        info!(to_elect, "Set election success");
    }

    pub fn to_elect(&self) -> bool {
        self.to_elect.load(Ordering::SeqCst)
    }

    pub fn set_fruit_only(&self, fruit_only: bool) {
        self.worker.set_fruit_only(fruit_only);
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }
}
