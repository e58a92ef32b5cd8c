/// Pending pools feeding the initial relay to new peers.
use std::collections::BTreeMap;

use alloy_primitives::Address;
use containers::{SnailBlock, Transaction};

pub trait TxPool: Send + Sync {
    /// Processable transactions grouped by sender, each group in nonce order.
    fn pending(&self) -> BTreeMap<Address, Vec<Transaction>>;
}

pub trait FruitPool: Send + Sync {
    /// Fruits waiting to be packed into a snail block.
    fn pending_fruits(&self) -> Vec<SnailBlock>;
}
