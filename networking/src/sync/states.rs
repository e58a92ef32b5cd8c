/// Result of one synchronisation attempt.
use crate::types::SyncMode;

use super::downloader::DownloadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No peer was selectable.
    NoPeer,

    /// The peer is neither heavier on the snail chain nor higher on the fast
    /// chain. Nothing was downloaded.
    UpToDate,

    /// The peer was not heavier on the snail chain, but the fast chain was
    /// caught up to its head in `windows` windowed fetches.
    FastChainCaughtUp { from: u64, to: u64, windows: usize },

    /// Fast sync was selected, but the local fast-sync head is already at
    /// least as heavy as the peer.
    NothingToFetch,

    /// The snail chain downloader completed in the given mode.
    Synced(SyncMode),

    /// A downloader or fetcher call failed. The attempt is abandoned; the
    /// next trigger starts over.
    Aborted(DownloadError),
}

impl SyncOutcome {
    /// Whether the attempt ended with the snail chain downloader succeeding.
    pub fn is_full_catch_up(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }
}
