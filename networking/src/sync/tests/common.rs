//! Mock collaborators shared by the sync tests.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::U256;
use async_trait::async_trait;
use chain::config::DEVNET_CONFIG;
use chain::{FastChainReader, MemoryFastChain, MemorySnailChain, SnailChainReader};
use containers::{
    FastBlock, FastHeader, Hash, SnailBlock, SnailHeader, TotalDifficulty, Transaction,
};
use parking_lot::Mutex;

use crate::peer::{Peer, PeerError};
use crate::sync::{Broadcaster, DownloadError, Downloader, FastDownloader, FetchWindow, Fetcher, PeerPicker};
use crate::types::{PeerId, SyncMode};

pub struct MockPeer {
    pub id: PeerId,
    pub head: Hash,
    pub td: TotalDifficulty,
    pub fail_sends: bool,
    pub sent_transactions: Mutex<Vec<Vec<Transaction>>>,
    pub sent_fruits: Mutex<Vec<Vec<SnailBlock>>>,
}

impl MockPeer {
    pub fn new(index: u64, td: u64) -> Arc<Self> {
        Arc::new(Self::build(index, td, false))
    }

    pub fn failing(index: u64) -> Arc<Self> {
        Arc::new(Self::build(index, 0, true))
    }

    fn build(index: u64, td: u64, fail_sends: bool) -> Self {
        Self {
            id: PeerId::from_index(index),
            head: Hash::with_last_byte(index as u8),
            td: U256::from(td),
            fail_sends,
            sent_transactions: Mutex::new(Vec::new()),
            sent_fruits: Mutex::new(Vec::new()),
        }
    }

    pub fn transaction_packs(&self) -> Vec<Vec<u64>> {
        self.sent_transactions
            .lock()
            .iter()
            .map(|pack| pack.iter().map(|tx| tx.nonce).collect())
            .collect()
    }
}

#[async_trait]
impl Peer for MockPeer {
    fn id(&self) -> PeerId {
        self.id
    }

    fn head(&self) -> (Hash, TotalDifficulty) {
        (self.head, self.td)
    }

    async fn send_transactions(&self, transactions: Vec<Transaction>) -> Result<(), PeerError> {
        self.sent_transactions.lock().push(transactions);
        if self.fail_sends {
            return Err(PeerError::SendFailed { peer: self.id, reason: "connection reset".into() });
        }
        Ok(())
    }

    async fn send_fruits(&self, fruits: Vec<SnailBlock>) -> Result<(), PeerError> {
        self.sent_fruits.lock().push(fruits);
        if self.fail_sends {
            return Err(PeerError::Disconnected(self.id));
        }
        Ok(())
    }
}

/// Always serves the lowest pending peer id.
pub struct FirstPicker;

impl PeerPicker for FirstPicker {
    fn pick(&mut self, candidates: &[PeerId]) -> Option<PeerId> {
        candidates.first().copied()
    }
}

/// Transaction whose encoding grows with `payload` bytes.
pub fn transaction(nonce: u64, payload: usize) -> Transaction {
    Transaction::new(
        nonce,
        Default::default(),
        U256::from(1),
        21_000,
        U256::from(1),
        vec![0xaa; payload].into(),
    )
}

pub fn fruit(number: u64) -> SnailBlock {
    let header = SnailHeader {
        number,
        fruit: true,
        ..Default::default()
    };
    SnailBlock::new_fruit(&header, &[], &[])
}

/// Snail chain extended by `len` blocks of the given difficulty.
pub fn snail_chain(len: u64, difficulty: u64) -> Arc<MemorySnailChain> {
    let chain = Arc::new(MemorySnailChain::new(DEVNET_CONFIG.snail_genesis()));
    for _ in 0..len {
        extend_snail_chain(&chain, difficulty);
    }
    chain
}

pub fn extend_snail_chain(chain: &MemorySnailChain, difficulty: u64) {
    let parent = chain.current_block();
    let header = SnailHeader {
        parent_hash: parent.hash(),
        number: parent.number() + 1,
        difficulty: U256::from(difficulty),
        ..Default::default()
    };
    chain.insert(SnailBlock::new_block(&header, &[], &[]));
}

pub fn local_td(chain: &MemorySnailChain) -> u64 {
    let head = chain.current_block();
    chain
        .get_td(&head.hash(), head.number())
        .unwrap_or_default()
        .to::<u64>()
}

/// Fast chain extended up to `height`.
pub fn fast_chain(height: u64) -> Arc<MemoryFastChain> {
    let chain = Arc::new(MemoryFastChain::new(DEVNET_CONFIG.fast_genesis()));
    extend_fast_chain(&chain, height);
    chain
}

pub fn extend_fast_chain(chain: &MemoryFastChain, height: u64) {
    let mut parent = chain.current_block();
    while parent.number() < height {
        let header = FastHeader {
            parent_hash: parent.hash(),
            number: parent.number() + 1,
            ..Default::default()
        };
        chain.insert(FastBlock::new_with_header(&header));
        parent = chain.current_block();
    }
}

pub type SyncCall = (PeerId, SyncMode, Option<FetchWindow>);

/// Snail chain downloader. Extends the chain by one block on success.
pub struct MockSnailDownloader {
    pub chain: Option<Arc<MemorySnailChain>>,
    pub error: Option<DownloadError>,
    pub calls: Mutex<Vec<SyncCall>>,
    pub terminated: AtomicBool,
}

impl MockSnailDownloader {
    pub fn succeeding(chain: Option<Arc<MemorySnailChain>>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            error: None,
            calls: Mutex::new(Vec::new()),
            terminated: AtomicBool::new(false),
        })
    }

    pub fn failing(error: DownloadError) -> Arc<Self> {
        Arc::new(Self {
            chain: None,
            error: Some(error),
            calls: Mutex::new(Vec::new()),
            terminated: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Downloader for MockSnailDownloader {
    async fn synchronise(
        &self,
        peer: PeerId,
        _head: Hash,
        _td: TotalDifficulty,
        mode: SyncMode,
        window: Option<FetchWindow>,
    ) -> Result<(), DownloadError> {
        self.calls.lock().push((peer, mode, window));
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if let Some(chain) = &self.chain {
            extend_snail_chain(chain, 1);
        }
        Ok(())
    }

    fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

/// Fast chain downloader that imports at most `per_call` blocks per windowed
/// request, and reports a fixed remote head height.
pub struct MockFastDownloader {
    pub chain: Arc<MemoryFastChain>,
    pub remote_height: Option<u64>,
    pub per_call: u64,
    pub fetch_error: Option<DownloadError>,
    pub fetches: AtomicUsize,
    pub calls: Mutex<Vec<SyncCall>>,
    pub terminated: AtomicBool,
}

impl MockFastDownloader {
    pub fn new(chain: Arc<MemoryFastChain>, remote_height: Option<u64>, per_call: u64) -> Arc<Self> {
        Arc::new(Self {
            chain,
            remote_height,
            per_call,
            fetch_error: None,
            fetches: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            terminated: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.lock().clone()
    }

    pub fn windows(&self) -> Vec<FetchWindow> {
        self.calls().into_iter().filter_map(|(_, _, window)| window).collect()
    }
}

#[async_trait]
impl Downloader for MockFastDownloader {
    async fn synchronise(
        &self,
        peer: PeerId,
        _head: Hash,
        _td: TotalDifficulty,
        mode: SyncMode,
        window: Option<FetchWindow>,
    ) -> Result<(), DownloadError> {
        self.calls.lock().push((peer, mode, window));
        if let Some(window) = window {
            let target = window.origin + window.height.min(self.per_call);
            extend_fast_chain(&self.chain, target);
        }
        Ok(())
    }

    fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FastDownloader for MockFastDownloader {
    async fn fetch_height(&self, _peer: PeerId, _hint: Hash) -> Result<Option<FastHeader>, DownloadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fetch_error {
            return Err(err.clone());
        }
        Ok(self.remote_height.map(|number| FastHeader {
            number,
            ..Default::default()
        }))
    }
}

#[derive(Default)]
pub struct MockFetcher {
    pub started: AtomicBool,
    pub stopped: AtomicBool,
}

impl Fetcher for MockFetcher {
    fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockBroadcaster {
    pub snail_heads: Mutex<Vec<u64>>,
    pub fast_heads: Mutex<Vec<u64>>,
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast_snail_block(&self, block: Arc<SnailBlock>, _propagate: bool) {
        self.snail_heads.lock().push(block.number());
    }

    async fn broadcast_fast_block(&self, block: Arc<FastBlock>, _propagate: bool) {
        self.fast_heads.lock().push(block.number());
    }
}
