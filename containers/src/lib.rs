pub mod types;
pub mod transaction;
pub mod receipt;
pub mod derive;
pub mod header;
pub mod block;
pub mod fast_block;
pub mod storage;

pub use block::{by_number, by_received_at, BlockBody, BlockBy, SnailBlock};
pub use derive::{calc_uncle_hash, derive_root, EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH};
pub use fast_block::{FastBlock, PbftSign};
pub use header::{FastHeader, SnailHeader};
pub use receipt::{create_bloom, Receipt};
pub use storage::StorageBlock;
pub use transaction::Transaction;
pub use types::{BlockNonce, Hash, PublicKey, TotalDifficulty};
pub use alloy_primitives;
pub use alloy_rlp;
