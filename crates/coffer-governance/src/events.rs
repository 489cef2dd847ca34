//! Observer events and the append-only event log.

use coffer_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something observers can react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum GovernanceEvent {
    ProposalCreated {
        id: u64,
        amount: Amount,
        recipient: Address,
        proposer: Address,
        deposit: Amount,
    },
    VoteCast {
        id: u64,
        voter: Address,
        is_upvote: bool,
        weight: Amount,
    },
    Finalized {
        id: u64,
    },
    TreasuryFunded {
        source: Address,
        amount: Amount,
    },
    DepositWithdrawn {
        id: u64,
        proposer: Address,
        amount: Amount,
    },
}

impl fmt::Display for GovernanceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernanceEvent::ProposalCreated { id, amount, recipient, proposer, deposit } => write!(
                f,
                "ProposalCreated(id={}, amount={}, recipient={}, proposer={}, deposit={})",
                id, amount, recipient, proposer, deposit
            ),
            GovernanceEvent::VoteCast { id, voter, is_upvote, weight } => write!(
                f,
                "VoteCast(id={}, voter={}, up={}, weight={})",
                id, voter, is_upvote, weight
            ),
            GovernanceEvent::Finalized { id } => write!(f, "Finalized(id={})", id),
            GovernanceEvent::TreasuryFunded { source, amount } => {
                write!(f, "TreasuryFunded(source={}, amount={})", source, amount)
            }
            GovernanceEvent::DepositWithdrawn { id, proposer, amount } => write!(
                f,
                "DepositWithdrawn(id={}, proposer={}, amount={})",
                id, proposer, amount
            ),
        }
    }
}

/// Event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Sequence number, starting at 1
    pub seq: u64,
    pub event: GovernanceEvent,
}

/// Append-only event log.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(mut records: Vec<EventRecord>) -> Self {
        records.sort_by_key(|r| r.seq);
        Self { records }
    }

    /// Record that `push` would append next, without appending it.
    pub fn next_record(&self, event: GovernanceEvent) -> EventRecord {
        EventRecord {
            seq: self.last_seq() + 1,
            event,
        }
    }

    pub fn push(&mut self, record: EventRecord) {
        debug_assert_eq!(record.seq, self.last_seq() + 1);
        self.records.push(record);
    }

    pub fn last_seq(&self) -> u64 {
        self.records.last().map(|r| r.seq).unwrap_or(0)
    }

    /// Events with a sequence number greater than `seq`.
    pub fn since(&self, seq: u64) -> Vec<EventRecord> {
        let start = self.records.partition_point(|r| r.seq <= seq);
        self.records[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sequence_and_polling() {
        let mut log = EventLog::new();
        assert_eq!(log.last_seq(), 0);

        for id in 1..=3 {
            let record = log.next_record(GovernanceEvent::Finalized { id });
            log.push(record);
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.since(0).len(), 3);

        let tail = log.since(2);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].event, GovernanceEvent::Finalized { id: 3 });
        assert!(log.since(3).is_empty());
    }

    #[test]
    fn test_from_records_orders_by_seq() {
        let log = EventLog::from_records(vec![
            EventRecord { seq: 2, event: GovernanceEvent::Finalized { id: 2 } },
            EventRecord { seq: 1, event: GovernanceEvent::Finalized { id: 1 } },
        ]);
        assert_eq!(log.last_seq(), 2);
        assert_eq!(log.since(1)[0].event, GovernanceEvent::Finalized { id: 2 });
    }

    #[test]
    fn test_event_display() {
        let event = GovernanceEvent::VoteCast {
            id: 1,
            voter: Address::from_seed("investor3"),
            is_upvote: false,
            weight: Amount::from(5u64),
        };
        assert!(event.to_string().starts_with("VoteCast(id=1"));
    }
}
