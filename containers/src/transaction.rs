use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_rlp::{Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

use crate::Hash;

/// A signed value transfer or contract call.
///
/// Only the parts the node core relies on are modelled: the canonical RLP
/// encoding (used for the transaction root and for pack sizing) and the hash
/// derived from it. Signature recovery lives with the transaction pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub recipient: Address,
    pub amount: U256,
    pub payload: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    pub fn new(nonce: u64, recipient: Address, amount: U256, gas_limit: u64, gas_price: U256, payload: Bytes) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            recipient,
            amount,
            payload,
            ..Default::default()
        }
    }

    /// Keccak-256 of the RLP encoding.
    pub fn hash(&self) -> Hash {
        keccak256(alloy_rlp::encode(self))
    }

    /// Length in bytes of the RLP encoding.
    pub fn size(&self) -> usize {
        self.length()
    }
}
