/// Contracts of the chain download machinery.
///
/// The sync engine decides *when* and *what* to fetch; the implementations
/// behind these traits walk, validate and import the remote segments.
use std::sync::Arc;

use async_trait::async_trait;
use containers::{FastBlock, FastHeader, Hash, SnailBlock, TotalDifficulty};
use thiserror::Error;

use crate::types::{PeerId, SyncMode};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("downloader is busy with another sync")]
    Busy,
    #[error("sync was cancelled")]
    Cancelled,
    #[error("timed out waiting for peer {0}")]
    Timeout(PeerId),
    #[error("peer {peer} failed: {reason}")]
    PeerFailed { peer: PeerId, reason: String },
    #[error("peer {0} did not report a head")]
    Unavailable(PeerId),
    #[error("windowed fetch from {origin} made no progress")]
    NoProgress { origin: u64 },
}

/// Bounded range of fast chain heights for one windowed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchWindow {
    /// Local height the window starts at.
    pub origin: u64,
    /// Number of heights covered, never more than the configured maximum.
    pub height: u64,
}

impl FetchWindow {
    /// First height past the window.
    pub fn end(&self) -> u64 {
        self.origin.saturating_add(self.height)
    }
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Synchronise with `peer` up to the given head. A `window` restricts the
    /// request to a bounded range of heights; `None` means up to the head.
    async fn synchronise(
        &self,
        peer: PeerId,
        head: Hash,
        td: TotalDifficulty,
        mode: SyncMode,
        window: Option<FetchWindow>,
    ) -> Result<(), DownloadError>;

    /// Cancel any sync in progress. Called once on shutdown.
    fn terminate(&self);
}

/// Fast chain downloader. Also answers head-height queries.
#[async_trait]
pub trait FastDownloader: Downloader {
    /// Header of the fast chain head of `peer`. `hint` is the snail head the
    /// peer advertised. `None` when the peer has no fast chain head to report.
    async fn fetch_height(
        &self,
        peer: PeerId,
        hint: Hash,
    ) -> Result<Option<FastHeader>, DownloadError>;
}

/// Announcement-driven block fetcher.
pub trait Fetcher: Send + Sync {
    fn start(&self);

    fn stop(&self);
}

/// Propagates new heads to every connected peer.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast_snail_block(&self, block: Arc<SnailBlock>, propagate: bool);

    async fn broadcast_fast_block(&self, block: Arc<FastBlock>, propagate: bool);
}
