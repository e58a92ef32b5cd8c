/// In-memory chains and pools.
///
/// Back the standalone node and the sync/miner tests. They keep the whole
/// chain in memory and perform no validation beyond parent linkage for the
/// total difficulty bookkeeping.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use alloy_primitives::Address;
use containers::{FastBlock, Hash, SnailBlock, TotalDifficulty, Transaction};
use parking_lot::RwLock;
use tracing::debug;

use crate::pool::{FruitPool, TxPool};
use crate::reader::{FastChainReader, SnailChainReader};

#[derive(Debug)]
struct SnailState {
    canonical: Vec<Arc<SnailBlock>>,
    fast_head: Option<Arc<SnailBlock>>,
    tds: HashMap<Hash, TotalDifficulty>,
}

#[derive(Debug)]
pub struct MemorySnailChain {
    state: RwLock<SnailState>,
}

impl MemorySnailChain {
    pub fn new(genesis: SnailBlock) -> Self {
        let mut tds = HashMap::new();
        tds.insert(genesis.hash(), genesis.difficulty());
        Self {
            state: RwLock::new(SnailState {
                canonical: vec![Arc::new(genesis)],
                fast_head: None,
                tds,
            }),
        }
    }

    /// Append `block` to the canonical chain. Its total difficulty is the
    /// parent's plus its own difficulty.
    pub fn insert(&self, block: SnailBlock) -> TotalDifficulty {
        let mut state = self.state.write();
        let parent_td = state.tds.get(&block.parent_hash()).copied().unwrap_or_default();
        let td = parent_td + block.difficulty();
        debug!(number = block.number(), hash = %block.hash(), td = %td, "Inserted snail block");
        state.tds.insert(block.hash(), td);
        state.canonical.push(Arc::new(block));
        td
    }

    /// Record a fast-sync head that is not (yet) part of the canonical chain.
    pub fn set_fast_head(&self, block: SnailBlock, td: TotalDifficulty) {
        let mut state = self.state.write();
        state.tds.insert(block.hash(), td);
        state.fast_head = Some(Arc::new(block));
    }

    /// Drop every canonical block above `number`.
    pub fn rewind(&self, number: u64) {
        let mut state = self.state.write();
        state.canonical.retain(|block| block.number() <= number);
    }

    pub fn len(&self) -> usize {
        self.state.read().canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnailChainReader for MemorySnailChain {
    fn current_block(&self) -> Arc<SnailBlock> {
        let state = self.state.read();
        // `new` always stores a genesis block and `rewind` keeps height zero.
        Arc::clone(&state.canonical[state.canonical.len() - 1])
    }

    fn current_fast_block(&self) -> Arc<SnailBlock> {
        let fast_head = self.state.read().fast_head.clone();
        fast_head.unwrap_or_else(|| self.current_block())
    }

    fn get_td(&self, hash: &Hash, _number: u64) -> Option<TotalDifficulty> {
        self.state.read().tds.get(hash).copied()
    }

    fn get_td_by_hash(&self, hash: &Hash) -> Option<TotalDifficulty> {
        self.state.read().tds.get(hash).copied()
    }
}

#[derive(Debug)]
pub struct MemoryFastChain {
    blocks: RwLock<Vec<Arc<FastBlock>>>,
}

impl MemoryFastChain {
    pub fn new(genesis: FastBlock) -> Self {
        Self {
            blocks: RwLock::new(vec![Arc::new(genesis)]),
        }
    }

    pub fn insert(&self, block: FastBlock) {
        debug!(number = block.number(), hash = %block.hash(), "Inserted fast block");
        self.blocks.write().push(Arc::new(block));
    }

    pub fn block_by_number(&self, number: u64) -> Option<Arc<FastBlock>> {
        self.blocks.read().iter().find(|block| block.number() == number).cloned()
    }
}

impl FastChainReader for MemoryFastChain {
    fn current_block(&self) -> Arc<FastBlock> {
        let blocks = self.blocks.read();
        Arc::clone(&blocks[blocks.len() - 1])
    }
}

#[derive(Debug, Default)]
pub struct MemoryTxPool {
    pending: RwLock<BTreeMap<Address, Vec<Transaction>>>,
}

impl MemoryTxPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, from: Address, tx: Transaction) {
        self.pending.write().entry(from).or_default().push(tx);
    }
}

impl TxPool for MemoryTxPool {
    fn pending(&self) -> BTreeMap<Address, Vec<Transaction>> {
        self.pending.read().clone()
    }
}

#[derive(Debug, Default)]
pub struct MemoryFruitPool {
    fruits: RwLock<Vec<SnailBlock>>,
}

impl MemoryFruitPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, fruit: SnailBlock) {
        self.fruits.write().push(fruit);
    }
}

impl FruitPool for MemoryFruitPool {
    fn pending_fruits(&self) -> Vec<SnailBlock> {
        self.fruits.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEVNET_CONFIG;
    use alloy_primitives::U256;
    use containers::SnailHeader;

    fn child_of(parent: &SnailBlock, difficulty: u64) -> SnailBlock {
        let header = SnailHeader {
            parent_hash: parent.hash(),
            number: parent.number() + 1,
            difficulty: U256::from(difficulty),
            ..Default::default()
        };
        SnailBlock::new_block(&header, &[], &[])
    }

    #[test]
    fn td_accumulates_along_the_chain() {
        let genesis = DEVNET_CONFIG.snail_genesis();
        let chain = MemorySnailChain::new(genesis.clone());
        let one = child_of(&genesis, 10);
        let two = child_of(&one, 20);

        chain.insert(one);
        let td = chain.insert(two.clone());

        let head = chain.current_block();
        assert_eq!(head.hash(), two.hash());
        assert_eq!(td, genesis.difficulty() + U256::from(30));
        assert_eq!(chain.get_td(&head.hash(), head.number()), Some(td));
    }

    #[test]
    fn fast_head_defaults_to_current_block() {
        let genesis = DEVNET_CONFIG.snail_genesis();
        let chain = MemorySnailChain::new(genesis.clone());
        assert_eq!(chain.current_fast_block().hash(), genesis.hash());

        let pivot = child_of(&genesis, 5);
        chain.set_fast_head(pivot.clone(), U256::from(1));
        assert_eq!(chain.current_fast_block().hash(), pivot.hash());
        assert_eq!(chain.current_block().number(), 0);
    }

    #[test]
    fn rewind_keeps_genesis() {
        let genesis = DEVNET_CONFIG.snail_genesis();
        let chain = MemorySnailChain::new(genesis.clone());
        chain.insert(child_of(&genesis, 1));
        chain.rewind(0);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.current_block().hash(), genesis.hash());
    }
}
