use std::sync::OnceLock;
use std::time::SystemTime;

use alloy_primitives::{keccak256, Bytes};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

use crate::{create_bloom, derive_root, FastHeader, Hash, Receipt, Transaction};

/// A committee member's vote on a fast chain block.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbftSign {
    pub fast_height: u64,
    pub fast_hash: Hash,
    pub result: u32,
    pub sign: Bytes,
}

impl PbftSign {
    /// Hash of the signed content, excluding the signature itself.
    pub fn hash(&self) -> Hash {
        let payload_length = self.fast_height.length() + self.fast_hash.length() + self.result.length();
        let mut out = Vec::with_capacity(payload_length + 9);
        alloy_rlp::Header { list: true, payload_length }.encode(&mut out);
        self.fast_height.encode(&mut out);
        self.fast_hash.encode(&mut out);
        self.result.encode(&mut out);
        keccak256(out)
    }
}

/// A fast chain block: header, transactions and the committee signatures
/// that finalised it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FastBlock {
    header: FastHeader,
    transactions: Vec<Transaction>,
    signs: Vec<PbftSign>,

    #[serde(skip)]
    hash: OnceLock<Hash>,
    #[serde(skip)]
    size: OnceLock<usize>,

    #[serde(skip)]
    pub received_at: Option<SystemTime>,
}

impl FastBlock {
    fn assemble(header: FastHeader, transactions: Vec<Transaction>, signs: Vec<PbftSign>) -> Self {
        Self {
            header,
            transactions,
            signs,
            hash: OnceLock::new(),
            size: OnceLock::new(),
            received_at: None,
        }
    }

    /// Build a fast block. The header is copied; its transaction root, receipt
    /// root and bloom are replaced by values derived from the content.
    pub fn new(header: &FastHeader, transactions: &[Transaction], receipts: &[Receipt], signs: &[PbftSign]) -> Self {
        let mut header = header.copy();
        header.tx_hash = derive_root(transactions);
        header.receipt_hash = derive_root(receipts);
        if !receipts.is_empty() {
            header.bloom = create_bloom(receipts);
        }
        Self::assemble(header, transactions.to_vec(), signs.to_vec())
    }

    pub fn new_with_header(header: &FastHeader) -> Self {
        Self::assemble(header.copy(), Vec::new(), Vec::new())
    }

    /// New block with the header of `self` and the given content.
    pub fn with_body(&self, transactions: &[Transaction], signs: &[PbftSign]) -> Self {
        Self::assemble(self.header.copy(), transactions.to_vec(), signs.to_vec())
    }

    /// New block with `header` and the content of `self`.
    pub fn with_seal(&self, header: &FastHeader) -> Self {
        Self::assemble(header.copy(), self.transactions.clone(), self.signs.clone())
    }

    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| self.header.hash())
    }

    pub fn size(&self) -> usize {
        *self.size.get_or_init(|| self.length())
    }

    pub fn header(&self) -> FastHeader {
        self.header.copy()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn signs(&self) -> &[PbftSign] {
        &self.signs
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    pub fn snail_hash(&self) -> Hash {
        self.header.snail_hash
    }

    pub fn snail_number(&self) -> u64 {
        self.header.snail_number
    }

    pub fn time(&self) -> u64 {
        self.header.time
    }

    fn payload_length(&self) -> usize {
        self.header.length() + self.transactions.length() + self.signs.length()
    }
}

impl PartialEq for FastBlock {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.transactions == other.transactions && self.signs == other.signs
    }
}

impl Eq for FastBlock {}

impl Encodable for FastBlock {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        alloy_rlp::Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.header.encode(out);
        self.transactions.encode(out);
        self.signs.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for FastBlock {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let total = buf.len();
        let rlp_head = alloy_rlp::Header::decode(buf)?;
        if !rlp_head.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let payload_start = buf.len();

        let header = FastHeader::decode(buf)?;
        let transactions = Vec::<Transaction>::decode(buf)?;
        let signs = Vec::<PbftSign>::decode(buf)?;

        let consumed = payload_start - buf.len();
        if consumed != rlp_head.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: rlp_head.payload_length,
                got: consumed,
            });
        }

        let block = Self::assemble(header, transactions, signs);
        let _ = block.size.set(total - buf.len());
        Ok(block)
    }
}
