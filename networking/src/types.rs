use std::fmt::{self, Display};

use alloy_primitives::B512;
use serde::{Deserialize, Serialize};

/// 512-bit node identity (the uncompressed secp256k1 public key of the peer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub B512);

impl PeerId {
    /// Identity whose trailing bytes are the big-endian `index`. Handy for
    /// devnets and tests.
    pub fn from_index(index: u64) -> Self {
        PeerId(B512::left_padding_from(&index.to_be_bytes()))
    }
}

impl Display for PeerId {
    /// First 8 bytes in hex, enough to tell peers apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// How the snail chain downloader catches up with a peer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Download and execute every block.
    Full,
    /// Download state at a pivot block and fully verify only past it.
    Fast,
}

impl Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Full => write!(f, "full"),
            SyncMode::Fast => write!(f, "fast"),
        }
    }
}

/// Progress notifications published by the chain downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEvent {
    /// A sync cycle with a peer started.
    Started,
    /// The cycle finished and the local chain caught up.
    Done,
    /// The cycle was aborted.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_display_is_truncated_prefix() {
        let mut raw = B512::ZERO;
        raw[0] = 0xab;
        raw[7] = 0x01;
        raw[63] = 0xff;
        assert_eq!(PeerId(raw).to_string(), "ab00000000000001");
    }

    #[test]
    fn peer_ids_from_index_are_ordered() {
        assert!(PeerId::from_index(1) < PeerId::from_index(2));
        assert_eq!(PeerId::from_index(3).0[63], 3);
    }
}
