use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chain::{MemoryFruitPool, MemoryTxPool};
use pretty_assertions::assert_eq;

use super::common::*;
use crate::peer::PeerRegistry;
use crate::sync::{SyncCollaborators, SyncConfig, SyncOutcome, SyncService};

struct Setup {
    peers: Arc<PeerRegistry>,
    tx_pool: Arc<MemoryTxPool>,
    fruit_pool: Arc<MemoryFruitPool>,
    snail_downloader: Arc<MockSnailDownloader>,
    fast_downloader: Arc<MockFastDownloader>,
    snail_fetcher: Arc<MockFetcher>,
    fast_fetcher: Arc<MockFetcher>,
    service: SyncService,
}

fn setup(config: SyncConfig) -> Setup {
    let peers = Arc::new(PeerRegistry::new());
    let tx_pool = Arc::new(MemoryTxPool::new());
    let fruit_pool = Arc::new(MemoryFruitPool::new());
    let snail = snail_chain(1, 10);
    let fast = fast_chain(0);
    let snail_downloader = MockSnailDownloader::succeeding(Some(snail.clone()));
    let fast_downloader = MockFastDownloader::new(fast.clone(), None, 0);
    let snail_fetcher = Arc::new(MockFetcher::default());
    let fast_fetcher = Arc::new(MockFetcher::default());

    let collaborators = SyncCollaborators {
        peers: peers.clone(),
        tx_pool: tx_pool.clone(),
        fruit_pool: fruit_pool.clone(),
        snail_chain: snail,
        fast_chain: fast,
        snail_downloader: snail_downloader.clone(),
        fast_downloader: fast_downloader.clone(),
        snail_fetcher: snail_fetcher.clone(),
        fast_fetcher: fast_fetcher.clone(),
        broadcaster: Arc::new(MockBroadcaster::default()),
    };
    let service = SyncService::with_pickers(config, collaborators, FirstPicker, FirstPicker);

    Setup {
        peers,
        tx_pool,
        fruit_pool,
        snail_downloader,
        fast_downloader,
        snail_fetcher,
        fast_fetcher,
        service,
    }
}

fn quiet_config() -> SyncConfig {
    SyncConfig {
        force_sync_cycle_ms: 60_000,
        ..SyncConfig::default()
    }
}

async fn eventually(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn new_peer_receives_pending_pools() {
    let setup = setup(quiet_config());
    setup.tx_pool.add(Address::with_last_byte(2), transaction(5, 10));
    setup.tx_pool.add(Address::with_last_byte(1), transaction(3, 10));
    setup.tx_pool.add(Address::with_last_byte(1), transaction(4, 10));
    setup.fruit_pool.add(fruit(9));
    let handles = setup.service.spawn();

    let peer = MockPeer::new(1, 0);
    setup.service.on_peer_connected(peer.clone()).await;

    assert!(eventually(|| !peer.sent_transactions.lock().is_empty() && !peer.sent_fruits.lock().is_empty()).await);
    // Grouped by sender, senders in address order.
    assert_eq!(peer.transaction_packs(), vec![vec![3, 4, 5]]);
    assert_eq!(peer.sent_fruits.lock()[0][0].number(), 9);

    setup.service.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn loops_manage_fetchers_and_downloaders() {
    let setup = setup(quiet_config());
    let handles = setup.service.spawn();
    assert_eq!(handles.len(), 3);

    assert!(eventually(|| setup.snail_fetcher.started.load(Ordering::SeqCst)).await);
    assert!(setup.fast_fetcher.started.load(Ordering::SeqCst));
    assert!(!setup.snail_fetcher.stopped.load(Ordering::SeqCst));

    setup.service.shutdown();
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    assert!(setup.snail_fetcher.stopped.load(Ordering::SeqCst));
    assert!(setup.fast_fetcher.stopped.load(Ordering::SeqCst));
    assert!(setup.snail_downloader.terminated.load(Ordering::SeqCst));
    assert!(setup.fast_downloader.terminated.load(Ordering::SeqCst));
}

#[tokio::test]
async fn second_spawn_is_ignored() {
    let setup = setup(quiet_config());
    let handles = setup.service.spawn();
    assert!(setup.service.spawn().is_empty());
    setup.service.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn periodic_tick_syncs_with_best_peer() {
    let setup = setup(SyncConfig {
        force_sync_cycle_ms: 20,
        ..SyncConfig::default()
    });
    setup.peers.register(MockPeer::new(1, 10)).unwrap();
    setup.peers.register(MockPeer::new(2, 10_000_000)).unwrap();
    let handles = setup.service.spawn();

    assert!(eventually(|| !setup.snail_downloader.calls().is_empty()).await);
    assert_eq!(setup.snail_downloader.calls()[0].0, crate::types::PeerId::from_index(2));
    assert!(eventually(|| setup.service.flags().accept_txs()).await);

    setup.service.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn new_peer_trigger_waits_for_enough_peers() {
    let setup = setup(SyncConfig {
        min_desired_peer_count: 2,
        ..quiet_config()
    });
    let handles = setup.service.spawn();

    let first = MockPeer::new(1, 10_000_000);
    setup.peers.register(first.clone()).unwrap();
    setup.service.on_peer_connected(first).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(setup.snail_downloader.calls().is_empty());

    let second = MockPeer::new(2, 10);
    setup.peers.register(second.clone()).unwrap();
    setup.service.on_peer_connected(second).await;
    assert!(eventually(|| setup.snail_downloader.calls().len() == 1).await);

    setup.service.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn synchronise_now_without_peers_is_a_no_op() {
    let setup = setup(quiet_config());
    assert_eq!(setup.service.synchronise_now().await, SyncOutcome::NoPeer);
    assert!(setup.snail_downloader.calls().is_empty());
}

#[test]
fn config_defaults_match_protocol_constants() {
    let config: SyncConfig = serde_yaml::from_str("fast_sync: true").unwrap();
    assert_eq!(
        config,
        SyncConfig {
            fast_sync: true,
            ..SyncConfig::default()
        }
    );
    assert_eq!(config.force_sync_cycle(), crate::sync::FORCE_SYNC_CYCLE);
    assert_eq!(config.tx_pack_size, 100 * 1024);
    assert_eq!(config.min_desired_peer_count, 5);
}
