use alloy_primitives::{Bytes, B256, B64, U256};
use alloy_rlp::{RlpDecodableWrapper, RlpEncodableWrapper};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keccak-256 digest identifying headers, blocks and transactions.
pub type Hash = B256;

/// Cumulative proof-of-work weight of a chain up to and including a block.
pub type TotalDifficulty = U256;

/// Uncompressed public key bytes of a node taking part in committee election.
pub type PublicKey = Bytes;

/// A 64-bit value which proves (combined with the mix digest) that a
/// sufficient amount of computation has been carried out on a block.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    RlpEncodableWrapper,
    RlpDecodableWrapper,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct BlockNonce(pub B64);

impl BlockNonce {
    /// Big-endian encoding of `value` as a nonce.
    pub fn encode(value: u64) -> Self {
        BlockNonce(B64::from(value.to_be_bytes()))
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0 .0)
    }
}

impl FromStr for BlockNonce {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(BlockNonce(B64::from(bytes)))
    }
}

impl fmt::Display for BlockNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}
