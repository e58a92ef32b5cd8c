/// Sync engine of the dual-chain node.
///
/// This module decides when and how to pull missing chain data from peers and
/// pushes locally pending items to newly connected peers. It includes:
///
/// - **Pack Relay**: Streams pending transactions and fruits to new peers in
///   size-capped packs, one peer at a time
/// - **Synchroniser**: Compares local and remote chains and drives the snail
///   and fast chain downloaders
/// - **Sync Service**: Owns the relay and syncer loops and wires them to the
///   peer, pool and chain collaborators
///
/// ## Architecture
///
/// Every loop is a single tokio task with exclusive ownership of its state,
/// fed by channels:
/// 1. A peer connects: its pending snapshot goes to both relays and the
///    syncer is signalled
/// 2. The syncer spawns a synchronisation attempt against the best peer on
///    that signal (once enough peers are connected) and on a periodic tick
/// 3. An attempt either catches up the fast chain in bounded windows or runs
///    the snail chain downloader in full or fast mode
/// 4. After a successful catch-up the new heads are announced to all peers
///
/// Cross-loop state is limited to a handful of atomic flags ([`SyncFlags`]).
/// Attempts are not serialised against each other; the downloaders reject
/// concurrent requests.
pub mod config;
pub mod downloader;
pub mod flags;
pub mod relay;
pub mod service;
pub mod states;
pub mod synchroniser;

pub use config::*;
pub use downloader::{Broadcaster, DownloadError, Downloader, FastDownloader, Fetcher, FetchWindow};
pub use flags::SyncFlags;
pub use relay::{fill_pack, PackRelay, PeerPicker, RandomPicker, RelayHandle, Relayable};
pub use service::{SyncCollaborators, SyncService};
pub use states::SyncOutcome;
pub use synchroniser::Synchroniser;

#[cfg(test)]
mod tests;
