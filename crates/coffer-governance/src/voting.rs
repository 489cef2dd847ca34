//! Vote records: at most one vote per (voter, proposal), never removed.

use coffer_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: Address,
    pub proposal_id: u64,
    pub is_upvote: bool,
    /// Weight counted toward the tally
    pub weight: Amount,
}

/// Set of vote records keyed by `(voter, proposal)`.
#[derive(Debug, Default)]
pub struct VoteBook {
    records: HashMap<(Address, u64), VoteRecord>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, voter: &Address, proposal_id: u64) -> Option<&VoteRecord> {
        self.records.get(&(*voter, proposal_id))
    }

    /// Voted either way.
    pub fn has_voted(&self, voter: &Address, proposal_id: u64) -> bool {
        self.records.contains_key(&(*voter, proposal_id))
    }

    pub fn has_downvoted(&self, voter: &Address, proposal_id: u64) -> bool {
        self.get(voter, proposal_id).is_some_and(|r| !r.is_upvote)
    }

    /// Store a record. Returns false (and keeps the old one) on a repeat.
    pub fn insert(&mut self, record: VoteRecord) -> bool {
        let key = (record.voter, record.proposal_id);
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, record);
        true
    }

    /// All votes on one proposal.
    pub fn for_proposal(&self, proposal_id: u64) -> Vec<&VoteRecord> {
        let mut votes: Vec<_> = self
            .records
            .values()
            .filter(|r| r.proposal_id == proposal_id)
            .collect();
        votes.sort_by_key(|r| r.voter);
        votes
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

    fn record(voter: &str, id: u64, is_upvote: bool) -> VoteRecord {
        VoteRecord {
            voter: Address::from_seed(voter),
            proposal_id: id,
            is_upvote,
            weight: Amount::from(10u64),
        }
    }

    #[test]
    fn test_one_vote_per_voter_and_proposal() {
        let mut book = VoteBook::new();

        assert!(book.insert(record("alice", 1, true)));
        assert!(!book.insert(record("alice", 1, false)));
        assert!(book.insert(record("alice", 2, false)));

        assert_eq!(book.len(), 2);
        assert!(book.get(&Address::from_seed("alice"), 1).unwrap().is_upvote);
    }

    #[test]
    fn test_vote_direction_queries() {
        let mut book = VoteBook::new();
        book.insert(record("alice", 1, true));
        book.insert(record("bob", 1, false));

        let alice = Address::from_seed("alice");
        let bob = Address::from_seed("bob");
        assert!(book.has_voted(&alice, 1));
        assert!(!book.has_downvoted(&alice, 1));
        assert!(book.has_voted(&bob, 1));
        assert!(book.has_downvoted(&bob, 1));
        assert!(!book.has_voted(&bob, 2));
    }

    #[test]
    fn test_for_proposal() {
        let mut book = VoteBook::new();
        book.insert(record("alice", 1, true));
        book.insert(record("bob", 1, false));
        book.insert(record("carol", 2, true));

        assert_eq!(book.for_proposal(1).len(), 2);
        assert_eq!(book.for_proposal(3).len(), 0);
    }
}
