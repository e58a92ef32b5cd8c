/// Mining worker: fans start/stop and new work out to the registered agents.
///
/// Block assembly and sealing belong to the agents; the worker only tracks the
/// settings a new piece of work is built from.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use chain::SnailChainReader;
use containers::{Hash, PublicKey};
use parking_lot::RwLock;
use tracing::{debug, trace};

/// A sealing engine instance, e.g. one CPU or remote miner.
pub trait Agent: Send + Sync {
    fn start(&self);

    fn stop(&self);

    /// Hand over a new piece of work. Replaces whatever the agent was sealing.
    fn dispatch(&self, work: Work);

    /// Hashes per second.
    fn hash_rate(&self) -> u64;
}

/// Description of the next block or fruit to seal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub parent_hash: Hash,
    pub number: u64,
    pub coinbase: Address,
    pub extra: Bytes,
    pub fruit_only: bool,
    pub to_elect: bool,
    pub publickey: PublicKey,
}

#[derive(Debug, Default, Clone)]
struct Settings {
    coinbase: Address,
    extra: Bytes,
    fruit_only: bool,
    to_elect: bool,
    publickey: PublicKey,
}

pub struct Worker {
    chain: Arc<dyn SnailChainReader>,
    agents: RwLock<Vec<Arc<dyn Agent>>>,
    settings: RwLock<Settings>,
    mining: AtomicBool,
}

impl Worker {
    pub fn new(chain: Arc<dyn SnailChainReader>) -> Self {
        Self {
            chain,
            agents: RwLock::new(Vec::new()),
            settings: RwLock::new(Settings::default()),
            mining: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.mining.store(true, Ordering::SeqCst);
        for agent in self.agents.read().iter() {
            agent.start();
        }
    }

    pub fn stop(&self) {
        if self.mining.swap(false, Ordering::SeqCst) {
            for agent in self.agents.read().iter() {
                agent.stop();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.mining.load(Ordering::SeqCst)
    }

    pub fn register(&self, agent: Arc<dyn Agent>) {
        self.agents.write().push(agent);
    }

    /// Remove `agent` and stop it. Unknown agents are ignored.
    pub fn unregister(&self, agent: &Arc<dyn Agent>) {
        let removed = {
            let mut agents = self.agents.write();
            let before = agents.len();
            agents.retain(|known| !std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(agent)));
            before != agents.len()
        };
        if removed {
            agent.stop();
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.read().len()
    }

    pub fn hash_rate(&self) -> u64 {
        self.agents.read().iter().map(|agent| agent.hash_rate()).sum()
    }

    /// Build work on top of the current snail head and hand it to every agent.
    pub fn commit_new_work(&self) {
        if !self.is_running() {
            return;
        }
        let work = self.pending_work();
        debug!(number = work.number, parent = %work.parent_hash, fruit_only = work.fruit_only, "Committing new mining work");

        let agents = self.agents.read().clone();
        for agent in agents {
            agent.dispatch(work.clone());
        }
    }

    /// Work as it would be committed now.
    pub fn pending_work(&self) -> Work {
        let head = self.chain.current_block();
        let settings = self.settings.read().clone();
        Work {
            parent_hash: head.hash(),
            number: head.number() + 1,
            coinbase: settings.coinbase,
            extra: settings.extra,
            fruit_only: settings.fruit_only,
            to_elect: settings.to_elect,
            publickey: settings.publickey,
        }
    }

    pub fn set_coinbase(&self, coinbase: Address) {
        self.settings.write().coinbase = coinbase;
    }

    /// Extra data must already be within bounds.
    pub fn set_extra(&self, extra: Bytes) {
        trace!(len = extra.len(), "Worker extra data updated");
        self.settings.write().extra = extra;
    }

    pub fn set_election(&self, to_elect: bool, publickey: PublicKey) {
        let mut settings = self.settings.write();
        settings.to_elect = to_elect;
        settings.publickey = publickey;
    }

    pub fn set_fruit_only(&self, fruit_only: bool) {
        self.settings.write().fruit_only = fruit_only;
    }
}
