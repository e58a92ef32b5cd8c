/// Pack relay scheduler.
///
/// Streams the pending items of a resource kind (transactions or fruits) to
/// newly connected peers. Items are sent in size-capped packs, one pack in
/// flight at a time per scheduler, with the next peer picked by an injectable
/// policy once the previous pack completes.
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use containers::{SnailBlock, Transaction};
use rand::seq::SliceRandom;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};

use super::config::RELAY_CHANNEL_SIZE;
use crate::peer::{Peer, PeerError};
use crate::types::PeerId;

/// An item that can be relayed in packs.
#[async_trait]
pub trait Relayable: Clone + Send + Sync + 'static {
    /// Name used in logs.
    const KIND: &'static str;

    /// Encoded size in bytes, counted against the pack cap.
    fn encoded_size(&self) -> usize;

    /// Send one pack to `peer`.
    async fn deliver(peer: Arc<dyn Peer>, items: Vec<Self>) -> Result<(), PeerError>;
}

#[async_trait]
impl Relayable for Transaction {
    const KIND: &'static str = "transactions";

    fn encoded_size(&self) -> usize {
        self.size()
    }

    async fn deliver(peer: Arc<dyn Peer>, items: Vec<Self>) -> Result<(), PeerError> {
        peer.send_transactions(items).await
    }
}

#[async_trait]
impl Relayable for SnailBlock {
    const KIND: &'static str = "fruits";

    fn encoded_size(&self) -> usize {
        self.size()
    }

    async fn deliver(peer: Arc<dyn Peer>, items: Vec<Self>) -> Result<(), PeerError> {
        peer.send_fruits(items).await
    }
}

/// Chooses which pending peer is served next.
pub trait PeerPicker: Send + 'static {
    /// Pick one of `candidates`, which is never empty. `None` or an id not
    /// in `candidates` falls back to the first candidate.
    fn pick(&mut self, candidates: &[PeerId]) -> Option<PeerId>;
}

/// Uniformly random choice, so that no pending peer starves.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl PeerPicker for RandomPicker {
    fn pick(&mut self, candidates: &[PeerId]) -> Option<PeerId> {
        candidates.choose(&mut rand::thread_rng()).copied()
    }
}

/// Pop the next pack off the front of `queue`.
///
/// Items are taken in order while the running size stays within `cap`. The
/// first item is always taken, even when it alone exceeds the cap. Returns the
/// pack and its total encoded size.
pub fn fill_pack<I: Relayable>(queue: &mut VecDeque<I>, cap: usize) -> (Vec<I>, usize) {
    let mut pack = Vec::new();
    let mut size = 0;
    while let Some(item) = queue.front() {
        let item_size = item.encoded_size();
        if !pack.is_empty() && size + item_size > cap {
            break;
        }
        size += item_size;
        if let Some(item) = queue.pop_front() {
            pack.push(item);
        }
    }
    (pack, size)
}

struct RelayRequest<I> {
    peer: Arc<dyn Peer>,
    items: Vec<I>,
}

/// Sending half handed to the sync service.
pub struct RelayHandle<I> {
    requests: mpsc::Sender<RelayRequest<I>>,
}

impl<I> Clone for RelayHandle<I> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
        }
    }
}

impl<I: Relayable> RelayHandle<I> {
    /// Queue the pending snapshot for `peer`. Empty snapshots are dropped here.
    /// Returns `false` once the relay loop has exited.
    pub async fn relay(&self, peer: Arc<dyn Peer>, items: Vec<I>) -> bool {
        if items.is_empty() {
            return true;
        }
        self.requests.send(RelayRequest { peer, items }).await.is_ok()
    }
}

struct PendingQueue<I> {
    peer: Arc<dyn Peer>,
    items: VecDeque<I>,
}

/// Loop-owned state. Only the relay task touches it.
struct RelayScheduler<I> {
    pack_size: usize,
    pending: BTreeMap<PeerId, PendingQueue<I>>,
    sending: bool,
    picker: Box<dyn PeerPicker>,
    done: mpsc::Sender<(PeerId, Result<(), PeerError>)>,
}

impl<I: Relayable> RelayScheduler<I> {
    fn enqueue(&mut self, request: RelayRequest<I>) {
        let id = request.peer.id();
        debug!(peer = %id, kind = I::KIND, count = request.items.len(), "Queued pending items for relay");

        // A newer snapshot supersedes whatever is left of the previous one.
        self.pending.insert(
            id,
            PendingQueue {
                peer: request.peer,
                items: request.items.into(),
            },
        );
        if !self.sending {
            self.send(id);
        }
    }

    fn send(&mut self, id: PeerId) {
        let Some(queue) = self.pending.get_mut(&id) else {
            return;
        };
        let peer = Arc::clone(&queue.peer);
        let (pack, size) = fill_pack(&mut queue.items, self.pack_size);
        if queue.items.is_empty() {
            self.pending.remove(&id);
        }
        if pack.is_empty() {
            return;
        }

        trace!(peer = %id, kind = I::KIND, count = pack.len(), bytes = size, "Sending pack");
        self.sending = true;
        let done = self.done.clone();
        tokio::spawn(async move {
            let result = I::deliver(peer, pack).await;
            // The loop is gone if this fails; nothing left to report to.
            let _ = done.send((id, result)).await;
        });
    }

    fn on_done(&mut self, id: PeerId, result: Result<(), PeerError>) {
        self.sending = false;
        if let Err(err) = result {
            debug!(peer = %id, kind = I::KIND, error = %err, "Pack relay failed, dropping peer queue");
            self.pending.remove(&id);
        }

        if self.pending.is_empty() {
            return;
        }
        let candidates: Vec<PeerId> = self.pending.keys().copied().collect();
        // A picker that declines or names an unknown peer must not stall the
        // remaining queues.
        let next = self
            .picker
            .pick(&candidates)
            .filter(|id| self.pending.contains_key(id))
            .or_else(|| candidates.first().copied());
        if let Some(next) = next {
            self.send(next);
        }
    }
}

/// One relay loop. Created together with its [`RelayHandle`].
pub struct PackRelay<I> {
    scheduler: RelayScheduler<I>,
    requests: mpsc::Receiver<RelayRequest<I>>,
    done: mpsc::Receiver<(PeerId, Result<(), PeerError>)>,
}

impl<I: Relayable> PackRelay<I> {
    pub fn new(pack_size: usize, picker: impl PeerPicker) -> (Self, RelayHandle<I>) {
        let (request_tx, request_rx) = mpsc::channel(RELAY_CHANNEL_SIZE);
        let (done_tx, done_rx) = mpsc::channel(1);
        let relay = Self {
            scheduler: RelayScheduler {
                pack_size,
                pending: BTreeMap::new(),
                sending: false,
                picker: Box::new(picker),
                done: done_tx,
            },
            requests: request_rx,
            done: done_rx,
        };
        (relay, RelayHandle { requests: request_tx })
    }

    /// Run until `shutdown` fires or every handle is dropped. Unsent queues are
    /// abandoned; an in-flight send finishes on its own.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let PackRelay {
            mut scheduler,
            mut requests,
            mut done,
        } = self;

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => scheduler.enqueue(request),
                    None => break,
                },
                Some((id, result)) = done.recv() => scheduler.on_done(id, result),
                _ = shutdown.recv() => break,
            }
        }
        debug!(kind = I::KIND, abandoned = scheduler.pending.len(), "Relay loop stopped");
    }
}
