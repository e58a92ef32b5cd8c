/// Committee election contracts.
///
/// The election algorithm itself lives elsewhere; the miner only reacts to
/// committee start/stop announcements and asks whether it is a member.
use alloy_primitives::Address;
use containers::PublicKey;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered election events per subscriber.
pub const ELECTION_CHANNEL_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionOption {
    /// A new committee takes over block production.
    CommitteeStart,
    /// The announced committee finished its term.
    CommitteeStop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub coinbase: Address,
    pub publickey: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionEvent {
    pub option: ElectionOption,
    pub committee_id: u64,
    pub members: Vec<CommitteeMember>,
}

pub trait CommitteeElection: Send + Sync {
    fn subscribe_election_event(&self) -> broadcast::Receiver<ElectionEvent>;

    fn is_committee_member(&self, members: &[CommitteeMember], publickey: &[u8]) -> bool;
}

/// Election provider fed by hand. Used in single-node deployments, where no
/// committee is ever elected, and to script election sequences.
#[derive(Debug)]
pub struct LocalElection {
    events: broadcast::Sender<ElectionEvent>,
}

impl Default for LocalElection {
    fn default() -> Self {
        let (events, _) = broadcast::channel(ELECTION_CHANNEL_SIZE);
        Self { events }
    }
}

impl LocalElection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce `event` to every subscriber. Returns the number of receivers.
    pub fn publish(&self, event: ElectionEvent) -> usize {
        debug!(option = ?event.option, committee = event.committee_id, members = event.members.len(), "Publishing election event");
        self.events.send(event).unwrap_or(0)
    }
}

impl CommitteeElection for LocalElection {
    fn subscribe_election_event(&self) -> broadcast::Receiver<ElectionEvent> {
        self.events.subscribe()
    }

    fn is_committee_member(&self, members: &[CommitteeMember], publickey: &[u8]) -> bool {
        !publickey.is_empty() && members.iter().any(|member| member.publickey.as_ref() == publickey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(key: &[u8]) -> CommitteeMember {
        CommitteeMember {
            coinbase: Address::ZERO,
            publickey: PublicKey::copy_from_slice(key),
        }
    }

    #[test]
    fn membership_matches_public_key() {
        let election = LocalElection::new();
        let members = vec![member(&[1, 2]), member(&[3, 4])];

        assert!(election.is_committee_member(&members, &[3, 4]));
        assert!(!election.is_committee_member(&members, &[5]));
        assert!(!election.is_committee_member(&members, &[]));
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let election = LocalElection::new();
        let event = ElectionEvent {
            option: ElectionOption::CommitteeStop,
            committee_id: 1,
            members: Vec::new(),
        };
        assert_eq!(election.publish(event.clone()), 0);

        let mut rx = election.subscribe_election_event();
        assert_eq!(election.publish(event.clone()), 1);
        assert_eq!(rx.try_recv().unwrap(), event);
    }
}
