pub mod peer;
pub mod sync;
pub mod types;

pub use peer::{Peer, PeerError, PeerRegistry, PeerSet};
pub use types::{PeerId, SyncEvent, SyncMode};
