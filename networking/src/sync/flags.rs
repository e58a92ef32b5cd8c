/// Flags shared between the sync loops and the protocol handler.
///
/// Each flag has one writer at a time and no invariant spans two of them, so
/// plain atomics suffice. Readers must tolerate momentary disagreement between
/// flags.
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SyncFlags {
    fast_sync: AtomicBool,
    accept_txs: AtomicBool,
    accept_fruits: AtomicBool,
}

impl SyncFlags {
    pub fn new(fast_sync: bool) -> Self {
        Self {
            fast_sync: AtomicBool::new(fast_sync),
            ..Default::default()
        }
    }

    pub fn fast_sync(&self) -> bool {
        self.fast_sync.load(Ordering::SeqCst)
    }

    pub fn set_fast_sync(&self, enabled: bool) {
        self.fast_sync.store(enabled, Ordering::SeqCst);
    }

    /// Whether transactions received from peers are accepted. Off until the
    /// first successful catch-up.
    pub fn accept_txs(&self) -> bool {
        self.accept_txs.load(Ordering::SeqCst)
    }

    pub fn set_accept_txs(&self, accept: bool) {
        self.accept_txs.store(accept, Ordering::SeqCst);
    }

    pub fn accept_fruits(&self) -> bool {
        self.accept_fruits.load(Ordering::SeqCst)
    }

    pub fn set_accept_fruits(&self, accept: bool) {
        self.accept_fruits.store(accept, Ordering::SeqCst);
    }
}
