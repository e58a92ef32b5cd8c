use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::Context;
use chain::config::DEVNET_CONFIG;
use chain::{MemoryFastChain, MemoryFruitPool, MemorySnailChain, MemoryTxPool};
use clap::Parser;
use miner::election::LocalElection;
use miner::worker::Worker;
use miner::Miner;
use networking::sync::{SyncCollaborators, SyncService};
use networking::PeerRegistry;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod standalone;

use config::NodeConfig;
use standalone::{IdleDownloader, IdleFetcher, LogBroadcaster};

#[derive(Parser, Debug)]
struct Args {
    /// YAML node configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default log directive, used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,

    /// Ignore committee elections.
    #[arg(long)]
    single_node: bool,

    /// Start mining right away.
    #[arg(long)]
    mine: bool,

    #[arg(long)]
    coinbase: Option<Address>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)))
        .init();

    let mut config = match &args.config {
        Some(path) => NodeConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config.miner.single_node |= args.single_node;
    config.miner.mine |= args.mine;
    if let Some(coinbase) = args.coinbase {
        config.miner.coinbase = coinbase;
    }

    let snail_chain = Arc::new(MemorySnailChain::new(DEVNET_CONFIG.snail_genesis()));
    let fast_chain = Arc::new(MemoryFastChain::new(DEVNET_CONFIG.fast_genesis()));
    let (sync_events, _) = broadcast::channel(16);
    let downloader = Arc::new(IdleDownloader::new(sync_events.clone()));

    let sync = SyncService::new(
        config.sync.clone(),
        SyncCollaborators {
            peers: Arc::new(PeerRegistry::new()),
            tx_pool: Arc::new(MemoryTxPool::new()),
            fruit_pool: Arc::new(MemoryFruitPool::new()),
            snail_chain: snail_chain.clone(),
            fast_chain,
            snail_downloader: downloader.clone(),
            fast_downloader: downloader,
            snail_fetcher: Arc::new(IdleFetcher { name: "snail" }),
            fast_fetcher: Arc::new(IdleFetcher { name: "fast" }),
            broadcaster: Arc::new(LogBroadcaster),
        },
    );

    let worker = Arc::new(Worker::new(snail_chain));
    let miner = Miner::new(config.miner.clone(), worker, Arc::new(LocalElection::new()));

    let mut handles = sync.spawn();
    handles.extend(miner.spawn(sync_events.subscribe()));
    if config.miner.mine {
        miner.start(config.miner.coinbase);
    }

    info!(
        genesis = %DEVNET_CONFIG.snail_genesis().hash(),
        single_node = config.miner.single_node,
        mining = miner.mining(),
        "Node started"
    );

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutting down");

    sync.shutdown();
    miner.shutdown();
    for handle in handles {
        handle.await.context("joining background task")?;
    }

    info!("Main async task exiting...");
    Ok(())
}
