use alloy_primitives::{Bytes, U256};
use containers::{FastBlock, FastHeader, SnailBlock, SnailHeader};

/// Upper bound on the extra-data field a miner may put into a header.
pub const MAXIMUM_EXTRA_DATA_SIZE: usize = 32;

pub const GENESIS_GAS_LIMIT: u64 = 16_777_216;
pub const GENESIS_DIFFICULTY: u64 = 131_072;
pub const GENESIS_TIMESTAMP: u64 = 1_537_891_200;
pub const GENESIS_EXTRA: &[u8] = b"truechain genesis";

#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub maximum_extra_data_size: usize,
    pub genesis_gas_limit: u64,
    pub genesis_difficulty: u64,
    pub genesis_timestamp: u64,
}

pub const DEVNET_CONFIG: ChainConfig = ChainConfig {
    maximum_extra_data_size: MAXIMUM_EXTRA_DATA_SIZE,
    genesis_gas_limit: GENESIS_GAS_LIMIT,
    genesis_difficulty: GENESIS_DIFFICULTY,
    genesis_timestamp: GENESIS_TIMESTAMP,
};

impl ChainConfig {
    /// Height-zero snail block. Its difficulty is the chain's initial total
    /// difficulty.
    pub fn snail_genesis(&self) -> SnailBlock {
        let header = SnailHeader {
            difficulty: U256::from(self.genesis_difficulty),
            gas_limit: self.genesis_gas_limit,
            time: self.genesis_timestamp,
            extra: Bytes::from_static(GENESIS_EXTRA),
            ..Default::default()
        };
        SnailBlock::new_block(&header, &[], &[])
    }

    /// Height-zero fast block.
    pub fn fast_genesis(&self) -> FastBlock {
        let header = FastHeader {
            gas_limit: self.genesis_gas_limit,
            time: self.genesis_timestamp,
            extra: Bytes::from_static(GENESIS_EXTRA),
            ..Default::default()
        };
        FastBlock::new(&header, &[], &[], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_blocks_are_stable() {
        let a = DEVNET_CONFIG.snail_genesis();
        let b = DEVNET_CONFIG.snail_genesis();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.number(), 0);
        assert_eq!(DEVNET_CONFIG.fast_genesis().number(), 0);
    }

    #[test]
    fn genesis_extra_fits_in_a_header() {
        assert!(GENESIS_EXTRA.len() <= MAXIMUM_EXTRA_DATA_SIZE);
    }
}
