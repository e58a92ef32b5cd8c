use alloy_rlp::{Decodable, Encodable};

use crate::{SnailBlock, TotalDifficulty};

/// Legacy database form of a snail block: the wire encoding followed by the
/// total difficulty of the chain up to and including the block.
///
/// Kept only so that old databases can be read during an upgrade. The total
/// difficulty never takes part in the block hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageBlock {
    pub block: SnailBlock,
    pub td: TotalDifficulty,
}

impl StorageBlock {
    pub fn new(block: SnailBlock, td: TotalDifficulty) -> Self {
        Self { block, td }
    }

    pub fn into_parts(self) -> (SnailBlock, TotalDifficulty) {
        (self.block, self.td)
    }

    fn payload_length(&self) -> usize {
        self.block.length() + self.td.length()
    }
}

impl Encodable for StorageBlock {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        alloy_rlp::Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.block.encode(out);
        self.td.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for StorageBlock {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let rlp_head = alloy_rlp::Header::decode(buf)?;
        if !rlp_head.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let payload_start = buf.len();
        let block = SnailBlock::decode(buf)?;
        let td = TotalDifficulty::decode(buf)?;

        let consumed = payload_start - buf.len();
        if consumed != rlp_head.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: rlp_head.payload_length,
                got: consumed,
            });
        }
        Ok(Self { block, td })
    }
}
