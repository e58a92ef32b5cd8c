/// Synchronisation attempts against a single peer.
use std::sync::Arc;

use chain::{FastChainReader, SnailChainReader};
use containers::{Hash, TotalDifficulty};
use tracing::{debug, info, warn};

use super::downloader::{Broadcaster, DownloadError, Downloader, FastDownloader, FetchWindow};
use super::flags::SyncFlags;
use super::states::SyncOutcome;
use crate::peer::Peer;
use crate::types::{PeerId, SyncMode};

pub struct Synchroniser {
    snail_chain: Arc<dyn SnailChainReader>,
    fast_chain: Arc<dyn FastChainReader>,
    snail_downloader: Arc<dyn Downloader>,
    fast_downloader: Arc<dyn FastDownloader>,
    broadcaster: Arc<dyn Broadcaster>,
    flags: Arc<SyncFlags>,
    max_window: u64,
}

impl Synchroniser {
    pub fn new(
        snail_chain: Arc<dyn SnailChainReader>,
        fast_chain: Arc<dyn FastChainReader>,
        snail_downloader: Arc<dyn Downloader>,
        fast_downloader: Arc<dyn FastDownloader>,
        broadcaster: Arc<dyn Broadcaster>,
        flags: Arc<SyncFlags>,
        max_window: u64,
    ) -> Self {
        Self {
            snail_chain,
            fast_chain,
            snail_downloader,
            fast_downloader,
            broadcaster,
            flags,
            max_window: max_window.max(1),
        }
    }

    pub fn flags(&self) -> &Arc<SyncFlags> {
        &self.flags
    }

    /// Run one attempt against `peer`.
    ///
    /// Failures abort the attempt and are reported through the returned
    /// outcome; nothing is retried here.
    pub async fn synchronise(&self, peer: Option<Arc<dyn Peer>>) -> SyncOutcome {
        let Some(peer) = peer else {
            return SyncOutcome::NoPeer;
        };
        let id = peer.id();

        let current = self.snail_chain.current_block();
        let local_td = self
            .snail_chain
            .get_td(&current.hash(), current.number())
            .unwrap_or_default();
        let (peer_head, peer_td) = peer.head();

        if peer_td <= local_td {
            return self.catch_up_fast_chain(id, peer_head, peer_td).await;
        }

        let mode = self.select_mode(current.number());
        if mode == SyncMode::Fast {
            let fast_head = self.snail_chain.current_fast_block();
            let fast_td = self
                .snail_chain
                .get_td_by_hash(&fast_head.hash())
                .unwrap_or_default();
            if fast_td >= peer_td {
                debug!(peer = %id, fast_td = %fast_td, peer_td = %peer_td, "Fast sync head already ahead of peer");
                return SyncOutcome::NothingToFetch;
            }
        }

        debug!(peer = %id, %mode, local_td = %local_td, peer_td = %peer_td, "Synchronising snail chain");
        if let Err(err) = self
            .snail_downloader
            .synchronise(id, peer_head, peer_td, mode, None)
            .await
        {
            debug!(peer = %id, %mode, error = %err, "Snail chain sync aborted");
            return SyncOutcome::Aborted(err);
        }

        self.on_caught_up();
        SyncOutcome::Synced(mode)
    }

    /// Cancel whatever the downloaders are doing.
    pub fn terminate(&self) {
        self.snail_downloader.terminate();
        self.fast_downloader.terminate();
    }

    fn select_mode(&self, local_number: u64) -> SyncMode {
        if self.flags.fast_sync() {
            return SyncMode::Fast;
        }
        // Heuristic: a snail chain back at genesis with a fast-sync head above
        // it means a fast sync was rolled back below its pivot. Resuming in
        // fast mode is then safe.
        let fast_number = self.snail_chain.current_fast_block().number();
        if local_number == 0 && fast_number > 0 {
            info!(fast_number, "Snail chain at genesis with fast-sync head ahead, re-enabling fast sync");
            self.flags.set_fast_sync(true);
            return SyncMode::Fast;
        }
        SyncMode::Full
    }

    async fn catch_up_fast_chain(&self, id: PeerId, head: Hash, td: TotalDifficulty) -> SyncOutcome {
        let remote = match self.fast_downloader.fetch_height(id, head).await {
            Ok(Some(header)) => header.number,
            Ok(None) => return SyncOutcome::UpToDate,
            Err(err) => {
                debug!(peer = %id, error = %err, "Fetching fast chain height failed");
                return SyncOutcome::Aborted(err);
            }
        };

        let from = self.fast_chain.block_number();
        if remote <= from {
            return SyncOutcome::UpToDate;
        }

        debug!(peer = %id, local = from, remote, "Catching up fast chain");
        let mut local = from;
        let mut windows = 0;
        while local < remote {
            let window = FetchWindow {
                origin: local,
                height: (remote - local).min(self.max_window),
            };
            if let Err(err) = self
                .fast_downloader
                .synchronise(id, head, td, SyncMode::Full, Some(window))
                .await
            {
                debug!(peer = %id, origin = window.origin, height = window.height, error = %err, "Fast chain sync aborted");
                return SyncOutcome::Aborted(err);
            }
            windows += 1;

            let reached = self.fast_chain.block_number();
            if reached <= local {
                warn!(peer = %id, origin = window.origin, height = window.height, "Fast chain window made no progress");
                return SyncOutcome::Aborted(DownloadError::NoProgress { origin: local });
            }
            local = reached;
        }

        SyncOutcome::FastChainCaughtUp {
            from,
            to: local,
            windows,
        }
    }

    fn on_caught_up(&self) {
        if self.flags.fast_sync() {
            info!("Fast sync complete, auto disabling");
            self.flags.set_fast_sync(false);
        }
        self.flags.set_accept_txs(true);
        self.flags.set_accept_fruits(true);

        let snail_head = self.snail_chain.current_block();
        if snail_head.number() > 0 {
            let broadcaster = Arc::clone(&self.broadcaster);
            tokio::spawn(async move { broadcaster.broadcast_snail_block(snail_head, false).await });
        }
        let fast_head = self.fast_chain.current_block();
        if fast_head.number() > 0 {
            let broadcaster = Arc::clone(&self.broadcaster);
            tokio::spawn(async move { broadcaster.broadcast_fast_block(fast_head, false).await });
        }
    }
}
