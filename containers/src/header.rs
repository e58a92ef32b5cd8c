use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, U256};
use alloy_rlp::{Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

use crate::{BlockNonce, Hash};

/// Header of a proof-of-work (snail) chain block or of a fruit.
///
/// The same header layout is used for both kinds; `fruit` is the discriminant
/// and is part of the consensus hash. A fruit points at the fast-chain block it
/// records through `fast_hash`/`fast_number`, a snail block commits to its
/// fruits through `fruits_hash`.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnailHeader {
    pub parent_hash: Hash,
    pub uncle_hash: Hash,
    pub coinbase: Address,
    pub root: Hash,
    pub tx_hash: Hash,
    pub receipt_hash: Hash,
    pub pointer_hash: Hash,
    pub fruits_hash: Hash,
    pub fast_hash: Hash,
    pub fast_number: u64,
    pub bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub publickey: Bytes,
    pub to_elect: bool,
    pub fruit: bool,
    pub time: u64,
    pub extra: Bytes,
    pub mix_digest: B256,
    pub nonce: BlockNonce,
}

impl SnailHeader {
    /// Keccak-256 of the RLP encoding of every header field.
    pub fn hash(&self) -> Hash {
        keccak256(alloy_rlp::encode(self))
    }

    /// Hash used as input for the proof-of-work search: all fields in header
    /// order except the seal (mix digest and nonce).
    pub fn hash_no_nonce(&self) -> Hash {
        keccak256(encode_fields(&[
            &self.parent_hash,
            &self.uncle_hash,
            &self.coinbase,
            &self.root,
            &self.tx_hash,
            &self.receipt_hash,
            &self.pointer_hash,
            &self.fruits_hash,
            &self.fast_hash,
            &self.fast_number,
            &self.bloom,
            &self.difficulty,
            &self.number,
            &self.gas_limit,
            &self.gas_used,
            &self.publickey,
            &self.to_elect,
            &self.fruit,
            &self.time,
            &self.extra,
        ]))
    }

    /// Copy whose byte fields live in fresh allocations.
    pub fn copy(&self) -> Self {
        Self {
            publickey: Bytes::copy_from_slice(&self.publickey),
            extra: Bytes::copy_from_slice(&self.extra),
            ..self.clone()
        }
    }

    pub fn is_fruit(&self) -> bool {
        self.fruit
    }

    /// Approximate memory footprint, used to bound caches.
    pub fn size(&self) -> usize {
        std::mem::size_of::<Self>() + self.extra.len() + self.publickey.len()
    }
}

/// Header of a committee-produced (fast) chain block.
///
/// `snail_hash`/`snail_number` anchor the block to the snail chain checkpoint
/// it was produced under.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastHeader {
    pub parent_hash: Hash,
    pub root: Hash,
    pub tx_hash: Hash,
    pub receipt_hash: Hash,
    pub bloom: Bloom,
    pub snail_hash: Hash,
    pub snail_number: u64,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub time: u64,
    pub extra: Bytes,
}

impl FastHeader {
    pub fn hash(&self) -> Hash {
        keccak256(alloy_rlp::encode(self))
    }

    /// Copy whose byte fields live in fresh allocations.
    pub fn copy(&self) -> Self {
        Self {
            extra: Bytes::copy_from_slice(&self.extra),
            ..self.clone()
        }
    }

    pub fn size(&self) -> usize {
        std::mem::size_of::<Self>() + self.extra.len()
    }
}

fn encode_fields(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length = fields.iter().map(|field| field.length()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    alloy_rlp::Header { list: true, payload_length }.encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}
