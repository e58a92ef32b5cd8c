/// Sync service configuration.
///
/// Protocol constants plus the runtime [`SyncConfig`] built from them.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval between forced sync attempts, even if few peers are available.
pub const FORCE_SYNC_CYCLE: Duration = Duration::from_secs(10);

/// Number of connected peers required before a new peer triggers a sync.
pub const MIN_DESIRED_PEER_COUNT: usize = 5;

/// Target size of a transaction pack. A pack exceeds it only when a single
/// transaction is larger on its own.
pub const TX_SYNC_PACK_SIZE: usize = 100 * 1024;

/// Target size of a fruit pack, with the same single-item exception.
pub const FRUIT_SYNC_PACK_SIZE: usize = 100 * 1024;

/// Maximum number of fast chain heights requested in one windowed fetch.
pub const MAX_FAST_SYNC_WINDOW: u64 = 600;

/// Buffered relay requests per relay loop.
pub const RELAY_CHANNEL_SIZE: usize = 64;

/// Buffered new-peer signals. Signals are coalesced when the buffer is full.
pub const NEW_PEER_CHANNEL_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub force_sync_cycle_ms: u64,
    pub min_desired_peer_count: usize,
    pub tx_pack_size: usize,
    pub fruit_pack_size: usize,
    pub max_fast_sync_window: u64,
    /// Start in fast sync mode. Cleared after the first successful catch-up.
    pub fast_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            force_sync_cycle_ms: FORCE_SYNC_CYCLE.as_millis() as u64,
            min_desired_peer_count: MIN_DESIRED_PEER_COUNT,
            tx_pack_size: TX_SYNC_PACK_SIZE,
            fruit_pack_size: FRUIT_SYNC_PACK_SIZE,
            max_fast_sync_window: MAX_FAST_SYNC_WINDOW,
            fast_sync: false,
        }
    }
}

impl SyncConfig {
    pub fn force_sync_cycle(&self) -> Duration {
        Duration::from_millis(self.force_sync_cycle_ms.max(1))
    }
}
