use alloy_primitives::{Bloom, Bytes};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// Outcome of executing one transaction, as committed to by the receipt root.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub post_state: Bytes,
    pub status: u64,
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
}

/// Union of the log blooms of every receipt.
pub fn create_bloom(receipts: &[Receipt]) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for receipt in receipts {
        bloom.accrue_bloom(&receipt.logs_bloom);
    }
    bloom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_is_union_of_receipts() {
        let mut first = Bloom::ZERO;
        first.0[0] = 0b0000_0001;
        let mut second = Bloom::ZERO;
        second.0[0] = 0b1000_0000;
        second.0[255] = 0x10;

        let receipts = vec![
            Receipt { logs_bloom: first, ..Default::default() },
            Receipt { logs_bloom: second, ..Default::default() },
        ];
        let bloom = create_bloom(&receipts);

        assert_eq!(bloom.0[0], 0b1000_0001);
        assert_eq!(bloom.0[255], 0x10);
        assert_eq!(create_bloom(&[]), Bloom::ZERO);
    }
}
