//! Engine configuration.
//!
//! Fixed when the engine is first deployed; a persisted engine refuses
//! to reopen under a different configuration.

use crate::error::GovernanceError;
use coffer_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Where vote weight is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteWeighting {
    /// Voter's token balance at the moment of voting
    #[default]
    Live,
    /// Voter's token balance when the proposal was created
    Snapshot,
}

/// Governance engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// "For" weight must strictly exceed this to finalize
    pub quorum: Amount,
    /// Vote weight source
    #[serde(default)]
    pub weighting: VoteWeighting,
    /// Token-ledger account holding proposal deposits
    #[serde(default = "default_escrow_address")]
    pub escrow_address: Address,
    /// Native-ledger account holding the treasury
    #[serde(default = "default_treasury_address")]
    pub treasury_address: Address,
}

fn default_escrow_address() -> Address {
    Address::from_seed("coffer/escrow")
}

fn default_treasury_address() -> Address {
    Address::from_seed("coffer/treasury")
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            // Just over half of a 1M token supply
            quorum: Amount::from_whole(500_000).saturating_add(&Amount::from(1u64)),
            weighting: VoteWeighting::Live,
            escrow_address: default_escrow_address(),
            treasury_address: default_treasury_address(),
        }
    }
}

impl GovernanceConfig {
    pub fn with_quorum(quorum: Amount) -> Self {
        Self {
            quorum,
            ..Default::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.escrow_address.is_zero() {
            return Err(GovernanceError::InvalidConfig(
                "escrow address cannot be zero".to_string(),
            ));
        }

        if self.treasury_address.is_zero() {
            return Err(GovernanceError::InvalidConfig(
                "treasury address cannot be zero".to_string(),
            ));
        }

        if self.escrow_address == self.treasury_address {
            return Err(GovernanceError::InvalidConfig(
                "escrow and treasury must be distinct accounts".to_string(),
            ));
        }

        Ok(())
    }
}
