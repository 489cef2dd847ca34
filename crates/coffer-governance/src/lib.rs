//! Coffer Governance - Stake-weighted treasury governance.
//!
//! Implements:
//! - Proposals requesting a payout from the treasury
//! - Token-weighted for/against voting (live or snapshot weighting)
//! - Quorum-gated finalization and treasury disbursement
//! - Escrowed proposal deposits
//! - Append-only event log and a durable store for external readers

pub mod config;
pub mod dao;
pub mod engine;
pub mod error;
pub mod events;
pub mod proposal;
pub mod store;
pub mod treasury;
pub mod voting;

pub use config::{GovernanceConfig, VoteWeighting};
pub use dao::Dao;
pub use engine::Governance;
pub use error::GovernanceError;
pub use events::{EventLog, EventRecord, GovernanceEvent};
pub use proposal::{Margin, Proposal, ProposalRequest, ProposalStatus, Tally};
pub use store::GovernanceStore;
pub use treasury::{TransactionType, Treasury, TreasuryTransaction};
pub use voting::VoteRecord;
