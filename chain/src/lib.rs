pub mod config;
pub mod memory;
pub mod pool;
pub mod reader;

pub use memory::{MemoryFastChain, MemoryFruitPool, MemorySnailChain, MemoryTxPool};
pub use pool::{FruitPool, TxPool};
pub use reader::{FastChainReader, SnailChainReader};
