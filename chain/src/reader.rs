/// Read access to the local chains.
///
/// Implemented by the chain databases; the sync engine only ever reads through
/// these traits and never holds on to the returned blocks past one attempt.
use std::sync::Arc;

use containers::{FastBlock, Hash, SnailBlock, TotalDifficulty};

/// Proof-of-work chain.
pub trait SnailChainReader: Send + Sync {
    /// Head of the canonical chain.
    fn current_block(&self) -> Arc<SnailBlock>;

    /// Head reached by fast sync. Ahead of [`Self::current_block`] while a fast
    /// sync is in progress, equal to it otherwise.
    fn current_fast_block(&self) -> Arc<SnailBlock>;

    /// Total difficulty of the chain ending in the given block.
    fn get_td(&self, hash: &Hash, number: u64) -> Option<TotalDifficulty>;

    fn get_td_by_hash(&self, hash: &Hash) -> Option<TotalDifficulty>;
}

/// Committee-produced chain.
pub trait FastChainReader: Send + Sync {
    fn current_block(&self) -> Arc<FastBlock>;

    /// Height of the current head.
    fn block_number(&self) -> u64 {
        self.current_block().number()
    }
}
