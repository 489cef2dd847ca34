//! Durable governance state.
//!
//! Column layout in the backing [`Database`]:
//! - `proposals`: big-endian id -> [`Proposal`]
//! - `votes`: voter bytes ++ big-endian id -> [`VoteRecord`]
//! - `events`: big-endian seq -> [`EventRecord`]
//! - `snapshots`: big-endian id -> holder weights at creation, kept
//!   until the proposal is finalized
//! - `meta`: `config`, `treasury`
//!
//! The store can be opened by read-only clients that never touch the
//! engine.

use crate::config::GovernanceConfig;
use crate::events::EventRecord;
use crate::proposal::Proposal;
use crate::treasury::Treasury;
use crate::voting::VoteRecord;
use coffer_storage::{Database, StorageError, WriteBatch};
use coffer_types::{Address, Amount};
use std::path::Path;

const PROPOSALS: &str = "proposals";
const VOTES: &str = "votes";
const EVENTS: &str = "events";
const SNAPSHOTS: &str = "snapshots";
const META: &str = "meta";

const CONFIG_KEY: &[u8] = b"config";
const TREASURY_KEY: &[u8] = b"treasury";

fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn vote_key(voter: &Address, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(Address::LEN + 8);
    key.extend_from_slice(voter.as_bytes());
    key.extend_from_slice(&id_key(id));
    key
}

/// Everything needed to rebuild an engine.
#[derive(Debug, Default)]
pub(crate) struct StoredState {
    pub config: Option<GovernanceConfig>,
    pub proposals: Vec<Proposal>,
    pub votes: Vec<VoteRecord>,
    pub events: Vec<EventRecord>,
    pub snapshots: Vec<(u64, Vec<(Address, Amount)>)>,
    pub treasury: Option<Treasury>,
}

/// Pending writes of one governance operation.
#[derive(Default)]
pub(crate) struct Changes {
    batch: WriteBatch,
}

impl Changes {
    pub fn put_config(&mut self, config: &GovernanceConfig) -> Result<(), StorageError> {
        self.batch.put(META, CONFIG_KEY, config)
    }

    pub fn put_treasury(&mut self, treasury: &Treasury) -> Result<(), StorageError> {
        self.batch.put(META, TREASURY_KEY, treasury)
    }

    pub fn put_proposal(&mut self, proposal: &Proposal) -> Result<(), StorageError> {
        self.batch.put(PROPOSALS, &id_key(proposal.id), proposal)
    }

    pub fn put_vote(&mut self, vote: &VoteRecord) -> Result<(), StorageError> {
        self.batch.put(VOTES, &vote_key(&vote.voter, vote.proposal_id), vote)
    }

    pub fn put_event(&mut self, record: &EventRecord) -> Result<(), StorageError> {
        self.batch.put(EVENTS, &id_key(record.seq), record)
    }

    pub fn put_snapshot(&mut self, id: u64, weights: &[(Address, Amount)]) -> Result<(), StorageError> {
        self.batch.put(SNAPSHOTS, &id_key(id), weights)
    }

    pub fn delete_snapshot(&mut self, id: u64) {
        self.batch.delete(SNAPSHOTS, &id_key(id));
    }
}

/// Governance state persisted in a JSON column store.
pub struct GovernanceStore {
    db: Database,
}

impl GovernanceStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    /// Configuration the engine was deployed with, if it ever was.
    pub fn config(&self) -> Result<Option<GovernanceConfig>, StorageError> {
        self.db.get(META, CONFIG_KEY)
    }

    pub fn quorum(&self) -> Result<Option<Amount>, StorageError> {
        Ok(self.config()?.map(|c| c.quorum))
    }

    pub fn proposal_count(&self) -> Result<u64, StorageError> {
        Ok(self.db.keys(PROPOSALS)?.len() as u64)
    }

    pub fn proposal(&self, id: u64) -> Result<Option<Proposal>, StorageError> {
        self.db.get(PROPOSALS, &id_key(id))
    }

    /// All proposals in id order.
    pub fn proposals(&self) -> Result<Vec<Proposal>, StorageError> {
        self.values(PROPOSALS)
    }

    pub fn vote(&self, voter: &Address, id: u64) -> Result<Option<VoteRecord>, StorageError> {
        self.db.get(VOTES, &vote_key(voter, id))
    }

    pub fn has_voted(&self, voter: &Address, id: u64) -> Result<bool, StorageError> {
        Ok(self.vote(voter, id)?.is_some())
    }

    pub fn has_downvoted(&self, voter: &Address, id: u64) -> Result<bool, StorageError> {
        Ok(self.vote(voter, id)?.is_some_and(|v| !v.is_upvote))
    }

    /// Number of stored vote-weight snapshots.
    pub fn snapshot_count(&self) -> Result<usize, StorageError> {
        Ok(self.db.keys(SNAPSHOTS)?.len())
    }

    pub fn treasury(&self) -> Result<Option<Treasury>, StorageError> {
        self.db.get(META, TREASURY_KEY)
    }

    /// Events with a sequence number greater than `seq`.
    pub fn events_since(&self, seq: u64) -> Result<Vec<EventRecord>, StorageError> {
        let mut events: Vec<EventRecord> = self.values(EVENTS)?;
        events.retain(|r| r.seq > seq);
        Ok(events)
    }

    pub(crate) fn load(&self) -> Result<StoredState, StorageError> {
        let mut snapshots = Vec::new();
        for key in self.db.keys(SNAPSHOTS)? {
            let id_bytes: [u8; 8] = key
                .as_slice()
                .try_into()
                .map_err(|_| StorageError::InvalidKey(hex::encode(&key)))?;
            if let Some(weights) = self.db.get(SNAPSHOTS, &key)? {
                snapshots.push((u64::from_be_bytes(id_bytes), weights));
            }
        }

        Ok(StoredState {
            config: self.config()?,
            proposals: self.proposals()?,
            votes: self.values(VOTES)?,
            events: self.values(EVENTS)?,
            snapshots,
            treasury: self.treasury()?,
        })
    }

    pub(crate) fn commit(&self, changes: Changes) -> Result<(), StorageError> {
        self.db.batch_write(changes.batch)
    }

    fn values<T: serde::de::DeserializeOwned>(&self, column: &str) -> Result<Vec<T>, StorageError> {
        let mut values = Vec::new();
        for key in self.db.keys(column)? {
            if let Some(value) = self.db.get(column, &key)? {
                values.push(value);
            }
        }
        Ok(values)
    }
}
