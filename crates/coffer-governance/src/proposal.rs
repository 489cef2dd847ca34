//! Proposal records and the append-only proposal registry.
//!
//! Proposals go through: Created -> (votes) -> Finalized. There is no
//! rejected state; a proposal that never reaches quorum stays open.

use coffer_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Accepting votes
    InProgress,
    /// Finalized and paid out
    Approved,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalStatus::InProgress => write!(f, "In Progress"),
            ProposalStatus::Approved => write!(f, "Approved"),
        }
    }
}

/// Caller-supplied fields of a new proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRequest {
    pub name: String,
    pub amount: Amount,
    pub recipient: Address,
    pub description: String,
    /// Tokens escrowed from the proposer
    pub deposit: Amount,
}

impl ProposalRequest {
    pub fn new(name: impl Into<String>, amount: Amount, recipient: Address, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            recipient,
            description: description.into(),
            deposit: Amount::ZERO,
        }
    }

    pub fn with_deposit(mut self, deposit: Amount) -> Self {
        self.deposit = deposit;
        self
    }
}

/// Stored proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential ID, starting at 1
    pub id: u64,
    pub name: String,
    pub description: String,
    pub proposer: Address,
    /// Native-currency payout on finalization
    pub amount: Amount,
    pub recipient: Address,
    /// Tokens held in escrow for this proposal
    pub deposit: Amount,
    /// "For" weight
    pub votes: Amount,
    /// "Against" weight
    pub down_votes: Amount,
    pub finalized: bool,
    #[serde(default)]
    pub deposit_withdrawn: bool,
}

impl Proposal {
    pub fn new(id: u64, proposer: Address, request: ProposalRequest) -> Self {
        Self {
            id,
            name: request.name,
            description: request.description,
            proposer,
            amount: request.amount,
            recipient: request.recipient,
            deposit: request.deposit,
            votes: Amount::ZERO,
            down_votes: Amount::ZERO,
            finalized: false,
            deposit_withdrawn: false,
        }
    }

    /// Raw "for" weight strictly above quorum; against votes do not offset.
    pub fn quorum_reached(&self, quorum: Amount) -> bool {
        self.votes > quorum
    }

    pub fn status(&self) -> ProposalStatus {
        if self.finalized {
            ProposalStatus::Approved
        } else {
            ProposalStatus::InProgress
        }
    }

    pub fn tally(&self, quorum: Amount) -> Tally {
        Tally {
            up: self.votes,
            down: self.down_votes,
            total: self.votes.saturating_add(&self.down_votes),
            margin: Margin::between(self.votes, self.down_votes),
            quorum_reached: self.quorum_reached(quorum),
        }
    }
}

/// Signed difference between "for" and "against" weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Margin {
    For(Amount),
    Against(Amount),
}

impl Margin {
    fn between(up: Amount, down: Amount) -> Self {
        match up.checked_sub(&down) {
            Some(lead) => Margin::For(lead),
            None => Margin::Against(down.saturating_sub(&up)),
        }
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Margin::For(lead) => write!(f, "{}", lead),
            Margin::Against(lead) => write!(f, "-{}", lead),
        }
    }
}

/// Read-side summary of a proposal's votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub up: Amount,
    pub down: Amount,
    pub total: Amount,
    pub margin: Margin,
    pub quorum_reached: bool,
}

/// Append-only proposal arena keyed by sequential ID.
#[derive(Debug, Default)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored proposals; IDs must run 1..=n without gaps.
    pub fn from_proposals(proposals: Vec<Proposal>) -> Result<Self, u64> {
        for (index, proposal) in proposals.iter().enumerate() {
            if proposal.id != index as u64 + 1 {
                return Err(proposal.id);
            }
        }
        Ok(Self { proposals })
    }

    /// ID the next created proposal will receive.
    pub fn next_id(&self) -> u64 {
        self.proposals.len() as u64 + 1
    }

    pub fn count(&self) -> u64 {
        self.proposals.len() as u64
    }

    /// Append a proposal built for `next_id()`.
    pub fn push(&mut self, proposal: Proposal) {
        debug_assert_eq!(proposal.id, self.next_id());
        self.proposals.push(proposal);
    }

    pub fn get(&self, id: u64) -> Option<&Proposal> {
        let index = id.checked_sub(1)?;
        self.proposals.get(usize::try_from(index).ok()?)
    }

    /// Replace a stored proposal with an updated copy of itself.
    pub fn replace(&mut self, proposal: Proposal) {
        if let Some(slot) = proposal
            .id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.proposals.get_mut(i))
        {
            *slot = proposal;
        }
    }

    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Proposals still accepting votes.
    pub fn open(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter().filter(|p| !p.finalized)
    }
}
