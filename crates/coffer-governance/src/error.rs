use coffer_ledger::LedgerError;
use coffer_storage::StorageError;
use coffer_types::{Address, Amount};
use thiserror::Error;

/// Errors that can occur in governance operations.
///
/// Every variant aborts the operation with no state change.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Unauthorized: {0} must be token holder")]
    Unauthorized(Address),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Proposal {0} already finalized")]
    AlreadyFinalized(u64),

    #[error("{voter} already voted on proposal {id}")]
    AlreadyVoted { voter: Address, id: u64 },

    #[error("Insufficient token balance for deposit: needed {needed}, available {available}")]
    InsufficientDeposit { needed: Amount, available: Amount },

    #[error("Quorum not reached: {votes} must exceed {quorum}")]
    QuorumNotReached { votes: Amount, quorum: Amount },

    #[error("Insufficient treasury funds: needed {needed}, available {available}")]
    InsufficientTreasuryFunds { needed: Amount, available: Amount },

    #[error("Only the proposer {proposer} may do this for proposal {id}")]
    NotProposer { id: u64, proposer: Address },

    #[error("Proposal {0} is not finalized")]
    NotFinalized(u64),

    #[error("Deposit for proposal {0} already withdrawn")]
    DepositAlreadyWithdrawn(u64),

    #[error("Proposal {0} has no deposit")]
    NoDeposit(u64),

    #[error("Treasury account {0} cannot be its own counterparty")]
    TreasuryCounterparty(Address),

    #[error("Treasury funding failed: {0}")]
    FundingFailed(LedgerError),

    #[error("Vote tally overflow on proposal {0}")]
    TallyOverflow(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
