/// Collaborators for a node running without a transport.
///
/// There is nothing to download from, so the downloaders only report the
/// sync lifecycle and the fetchers and broadcaster only log.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use containers::{FastBlock, FastHeader, Hash, SnailBlock, TotalDifficulty};
use networking::sync::{Broadcaster, DownloadError, Downloader, FastDownloader, FetchWindow, Fetcher};
use networking::{PeerId, SyncEvent, SyncMode};
use tokio::sync::broadcast;
use tracing::{debug, info};

pub struct IdleDownloader {
    events: broadcast::Sender<SyncEvent>,
    terminated: AtomicBool,
}

impl IdleDownloader {
    pub fn new(events: broadcast::Sender<SyncEvent>) -> Self {
        Self {
            events,
            terminated: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Downloader for IdleDownloader {
    async fn synchronise(
        &self,
        peer: PeerId,
        head: Hash,
        _td: TotalDifficulty,
        mode: SyncMode,
        window: Option<FetchWindow>,
    ) -> Result<(), DownloadError> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(DownloadError::Cancelled);
        }
        let _ = self.events.send(SyncEvent::Started);
        debug!(peer = %peer, head = %head, %mode, ?window, "No transport, nothing to download");
        let _ = self.events.send(SyncEvent::Done);
        Ok(())
    }

    fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        debug!("Downloader terminated");
    }
}

#[async_trait]
impl FastDownloader for IdleDownloader {
    async fn fetch_height(&self, _peer: PeerId, _hint: Hash) -> Result<Option<FastHeader>, DownloadError> {
        Ok(None)
    }
}

pub struct IdleFetcher {
    pub name: &'static str,
}

impl Fetcher for IdleFetcher {
    fn start(&self) {
        debug!(fetcher = self.name, "Fetcher started");
    }

    fn stop(&self) {
        debug!(fetcher = self.name, "Fetcher stopped");
    }
}

pub struct LogBroadcaster;

#[async_trait]
impl Broadcaster for LogBroadcaster {
    async fn broadcast_snail_block(&self, block: Arc<SnailBlock>, propagate: bool) {
        info!(number = block.number(), hash = %block.hash(), propagate, "Announcing snail head");
    }

    async fn broadcast_fast_block(&self, block: Arc<FastBlock>, propagate: bool) {
        info!(number = block.number(), hash = %block.hash(), propagate, "Announcing fast head");
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    #[tokio::test]
    async fn idle_sync_reports_lifecycle() {
        let (events, mut rx) = broadcast::channel(4);
        let downloader = IdleDownloader::new(events);

        let result = downloader
            .synchronise(PeerId::from_index(1), Hash::ZERO, U256::from(1), SyncMode::Full, None)
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(rx.recv().await.unwrap(), SyncEvent::Started);
        assert_eq!(rx.recv().await.unwrap(), SyncEvent::Done);
    }

    #[tokio::test]
    async fn terminated_downloader_cancels_sync() {
        let (events, mut rx) = broadcast::channel(4);
        let downloader = IdleDownloader::new(events);
        downloader.terminate();

        let result = downloader
            .synchronise(PeerId::from_index(1), Hash::ZERO, U256::from(1), SyncMode::Fast, None)
            .await;

        assert_eq!(result, Err(DownloadError::Cancelled));
        assert!(rx.try_recv().is_err());
    }
}
