use std::cmp::Ordering;
use std::sync::OnceLock;
use std::time::SystemTime;

use alloy_primitives::{Address, Bloom, U256};
use alloy_rlp::{Decodable, Encodable};
use serde::{Deserialize, Serialize};

use crate::{
    calc_uncle_hash, create_bloom, derive_root, Hash, Receipt, SnailHeader, Transaction,
    EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH,
};

/// Non-header content of a snail chain block.
///
/// A fruit carries transactions only; a regular snail block carries uncles and
/// the fruits it packs. The variant always agrees with the header's `fruit`
/// flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockBody {
    Fruit {
        transactions: Vec<Transaction>,
    },
    Block {
        uncles: Vec<SnailHeader>,
        fruits: Vec<SnailBlock>,
    },
}

impl BlockBody {
    fn empty(fruit: bool) -> Self {
        if fruit {
            BlockBody::Fruit { transactions: Vec::new() }
        } else {
            BlockBody::Block { uncles: Vec::new(), fruits: Vec::new() }
        }
    }
}

/// A snail chain block or fruit.
///
/// Blocks are read-only once built. Hash and encoded size are computed on
/// first use and cached; every operation producing a different block returns
/// a new value with empty caches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnailBlock {
    header: SnailHeader,
    body: BlockBody,

    #[serde(skip)]
    hash: OnceLock<Hash>,
    #[serde(skip)]
    size: OnceLock<usize>,

    /// Local arrival time, used by relay bookkeeping only.
    #[serde(skip)]
    pub received_at: Option<SystemTime>,
}

impl SnailBlock {
    fn assemble(header: SnailHeader, body: BlockBody) -> Self {
        Self {
            header,
            body,
            hash: OnceLock::new(),
            size: OnceLock::new(),
            received_at: None,
        }
    }

    /// Build a fruit. The header is copied; its transaction root, receipt root
    /// and bloom are replaced by values derived from `transactions` and
    /// `receipts`.
    pub fn new_fruit(header: &SnailHeader, transactions: &[Transaction], receipts: &[Receipt]) -> Self {
        let mut header = header.copy();
        header.fruit = true;
        header.tx_hash = derive_root(transactions);
        header.receipt_hash = derive_root(receipts);
        if !receipts.is_empty() {
            header.bloom = create_bloom(receipts);
        }

        Self::assemble(
            header,
            BlockBody::Fruit {
                transactions: transactions.to_vec(),
            },
        )
    }

    /// Build a snail block packing `fruits`. The header is copied; its
    /// fruit-set root and uncle hash are replaced by values derived from the
    /// content. Snail blocks carry no transactions of their own.
    pub fn new_block(header: &SnailHeader, uncles: &[SnailHeader], fruits: &[SnailBlock]) -> Self {
        let mut header = header.copy();
        header.fruit = false;
        header.tx_hash = EMPTY_ROOT_HASH;
        header.receipt_hash = EMPTY_ROOT_HASH;
        header.fruits_hash = derive_root(fruits);
        header.uncle_hash = if uncles.is_empty() {
            EMPTY_UNCLE_HASH
        } else {
            calc_uncle_hash(uncles)
        };

        Self::assemble(
            header,
            BlockBody::Block {
                uncles: uncles.iter().map(SnailHeader::copy).collect(),
                fruits: fruits.iter().map(SnailBlock::copy_fruit).collect(),
            },
        )
    }

    /// Block with a copy of `header` and an empty body of the matching kind.
    pub fn new_with_header(header: &SnailHeader) -> Self {
        Self::assemble(header.copy(), BlockBody::empty(header.fruit))
    }

    /// Fresh copy of a fruit: copied header, copied transactions, no caches.
    pub fn copy_fruit(&self) -> Self {
        let body = match &self.body {
            BlockBody::Fruit { transactions } => BlockBody::Fruit {
                transactions: transactions.clone(),
            },
            BlockBody::Block { uncles, fruits } => BlockBody::Block {
                uncles: uncles.iter().map(SnailHeader::copy).collect(),
                fruits: fruits.iter().map(SnailBlock::copy_fruit).collect(),
            },
        };
        Self::assemble(self.header.copy(), body)
    }

    /// New block with the body of `self` and `header` in place of the current
    /// one. A fruit header keeps only the transactions, any other header keeps
    /// the uncles and the fruits.
    pub fn with_seal(&self, header: &SnailHeader) -> Self {
        let body = if header.fruit {
            BlockBody::Fruit {
                transactions: self.transactions().to_vec(),
            }
        } else {
            BlockBody::Block {
                uncles: self.uncles().to_vec(),
                fruits: self.fruits().to_vec(),
            }
        };
        Self::assemble(header.copy(), body)
    }

    /// New block with the header of `self` and the given content. Fruits take
    /// `transactions`; snail blocks take `uncles` and keep their fruits.
    pub fn with_body(&self, transactions: &[Transaction], uncles: &[SnailHeader]) -> Self {
        let body = if self.header.fruit {
            BlockBody::Fruit {
                transactions: transactions.to_vec(),
            }
        } else {
            BlockBody::Block {
                uncles: uncles.iter().map(SnailHeader::copy).collect(),
                fruits: self.fruits().to_vec(),
            }
        };
        Self::assemble(self.header.copy(), body)
    }

    /// Keccak-256 of the header, computed once.
    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| self.header.hash())
    }

    /// Length of the block encoding, computed once.
    pub fn size(&self) -> usize {
        *self.size.get_or_init(|| self.length())
    }

    pub fn hash_no_nonce(&self) -> Hash {
        self.header.hash_no_nonce()
    }

    /// Copy of the header.
    pub fn header(&self) -> SnailHeader {
        self.header.copy()
    }

    pub fn body(&self) -> &BlockBody {
        &self.body
    }

    pub fn is_fruit(&self) -> bool {
        self.header.fruit
    }

    pub fn transactions(&self) -> &[Transaction] {
        match &self.body {
            BlockBody::Fruit { transactions } => transactions,
            BlockBody::Block { .. } => &[],
        }
    }

    pub fn transaction(&self, hash: &Hash) -> Option<&Transaction> {
        self.transactions().iter().find(|tx| tx.hash() == *hash)
    }

    pub fn uncles(&self) -> &[SnailHeader] {
        match &self.body {
            BlockBody::Block { uncles, .. } => uncles,
            BlockBody::Fruit { .. } => &[],
        }
    }

    pub fn fruits(&self) -> &[SnailBlock] {
        match &self.body {
            BlockBody::Block { fruits, .. } => fruits,
            BlockBody::Fruit { .. } => &[],
        }
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn difficulty(&self) -> U256 {
        self.header.difficulty
    }

    pub fn time(&self) -> u64 {
        self.header.time
    }

    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    pub fn pointer_hash(&self) -> Hash {
        self.header.pointer_hash
    }

    pub fn fast_hash(&self) -> Hash {
        self.header.fast_hash
    }

    pub fn fast_number(&self) -> u64 {
        self.header.fast_number
    }

    pub fn coinbase(&self) -> Address {
        self.header.coinbase
    }

    pub fn bloom(&self) -> Bloom {
        self.header.bloom
    }

    pub fn nonce(&self) -> u64 {
        self.header.nonce.as_u64()
    }

    pub fn extra(&self) -> Vec<u8> {
        self.header.extra.to_vec()
    }
}

impl PartialEq for SnailBlock {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.body == other.body
    }
}

impl Eq for SnailBlock {}

impl AsRef<SnailBlock> for SnailBlock {
    fn as_ref(&self) -> &SnailBlock {
        self
    }
}

// Wire form: `[header, transactions]` for fruits, `[header, uncles, fruits]`
// for snail blocks.
impl Encodable for SnailBlock {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        alloy_rlp::Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.header.encode(out);
        match &self.body {
            BlockBody::Fruit { transactions } => transactions.encode(out),
            BlockBody::Block { uncles, fruits } => {
                uncles.encode(out);
                fruits.encode(out);
            }
        }
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl SnailBlock {
    fn payload_length(&self) -> usize {
        self.header.length()
            + match &self.body {
                BlockBody::Fruit { transactions } => transactions.length(),
                BlockBody::Block { uncles, fruits } => uncles.length() + fruits.length(),
            }
    }
}

impl Decodable for SnailBlock {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let total = buf.len();
        let rlp_head = alloy_rlp::Header::decode(buf)?;
        if !rlp_head.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let payload_start = buf.len();

        let header = SnailHeader::decode(buf)?;
        let body = if header.fruit {
            BlockBody::Fruit {
                transactions: Vec::<Transaction>::decode(buf)?,
            }
        } else {
            BlockBody::Block {
                uncles: Vec::<SnailHeader>::decode(buf)?,
                fruits: Vec::<SnailBlock>::decode(buf)?,
            }
        };

        let consumed = payload_start - buf.len();
        if consumed != rlp_head.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: rlp_head.payload_length,
                got: consumed,
            });
        }

        let block = Self::assemble(header, body);
        let _ = block.size.set(total - buf.len());
        Ok(block)
    }
}

/// Ordering policy for blocks. Any strict weak ordering may be supplied;
/// [`by_number`] is the default.
pub struct BlockBy<F>(pub F);

impl<F> BlockBy<F>
where
    F: FnMut(&SnailBlock, &SnailBlock) -> Ordering,
{
    pub fn sort<B: AsRef<SnailBlock>>(mut self, blocks: &mut [B]) {
        blocks.sort_by(|a, b| (self.0)(a.as_ref(), b.as_ref()));
    }
}

/// Ascending height.
pub fn by_number(a: &SnailBlock, b: &SnailBlock) -> Ordering {
    a.number().cmp(&b.number())
}

/// Ascending arrival time; blocks without one sort first.
pub fn by_received_at(a: &SnailBlock, b: &SnailBlock) -> Ordering {
    a.received_at.cmp(&b.received_at)
}
