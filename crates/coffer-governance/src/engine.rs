//! The capability set every governance engine exposes to callers.
//!
//! [`crate::Dao`] is the shipped implementation. Alternative designs
//! (delegated or timelocked governance) plug in behind the same trait
//! instead of extending its state machine.

use crate::error::GovernanceError;
use crate::events::EventRecord;
use crate::proposal::{Proposal, ProposalRequest};
use coffer_types::{Address, Amount};

/// Governance operations. `caller` is the authenticated transaction sender.
///
/// Every mutating call is atomic: it either applies completely or fails
/// with a [`GovernanceError`] and leaves no trace.
pub trait Governance: Send + Sync {
    /// Open a new proposal and escrow its deposit. Returns the new id.
    fn create_proposal(&self, caller: &Address, request: ProposalRequest) -> Result<u64, GovernanceError>;

    /// Cast the caller's token weight for or against a proposal.
    fn vote(&self, caller: &Address, id: u64, is_upvote: bool) -> Result<(), GovernanceError>;

    /// Close a proposal past quorum and pay its recipient from the treasury.
    fn finalize_proposal(&self, caller: &Address, id: u64) -> Result<(), GovernanceError>;

    /// Move native currency from `source` into the treasury.
    fn fund(&self, source: &Address, amount: Amount) -> Result<(), GovernanceError>;

    /// Return a finalized proposal's deposit to its proposer.
    fn withdraw_deposit(&self, caller: &Address, id: u64) -> Result<Amount, GovernanceError>;

    fn proposal_count(&self) -> u64;

    fn proposal(&self, id: u64) -> Option<Proposal>;

    fn quorum(&self) -> Amount;

    /// Whether `voter` voted on proposal `id`, either way.
    fn has_voted(&self, voter: &Address, id: u64) -> bool;

    fn has_downvoted(&self, voter: &Address, id: u64) -> bool;

    fn treasury_balance(&self) -> Amount;

    /// Events with a sequence number greater than `seq`.
    fn events_since(&self, seq: u64) -> Vec<EventRecord>;
}
