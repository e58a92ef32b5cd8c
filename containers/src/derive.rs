use alloy_primitives::{b256, keccak256};
use alloy_rlp::Encodable;

use crate::{Hash, SnailHeader};

/// Root committed to by headers whose item list is empty: keccak256 of the
/// RLP empty string.
pub const EMPTY_ROOT_HASH: Hash =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Uncle hash of a block without uncles: keccak256 of the RLP empty list.
pub const EMPTY_UNCLE_HASH: Hash =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Ordered commitment over the canonical encodings of `items`.
///
/// Each item becomes a leaf `keccak256(rlp(index) ++ rlp(item))`, and the root is
/// the keccak256 of the RLP list of leaves. Swapping two items therefore changes
/// the root even when their encodings are identical in size. An empty list
/// yields [`EMPTY_ROOT_HASH`].
///
/// Used for the transaction root, the receipt root and the fruit-set root.
pub fn derive_root<T: Encodable>(items: &[T]) -> Hash {
    if items.is_empty() {
        return EMPTY_ROOT_HASH;
    }

    let leaves: Vec<Hash> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut buf = Vec::with_capacity(item.length() + 9);
            (index as u64).encode(&mut buf);
            item.encode(&mut buf);
            keccak256(&buf)
        })
        .collect();

    keccak256(alloy_rlp::encode(&leaves))
}

/// Commitment over the uncle headers of a block.
pub fn calc_uncle_hash(uncles: &[SnailHeader]) -> Hash {
    let mut out = Vec::new();
    alloy_rlp::encode_list::<_, SnailHeader>(uncles, &mut out);
    keccak256(out)
}
