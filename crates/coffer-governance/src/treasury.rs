//! Treasury accounting.
//!
//! The treasury balance lives on the native-currency ledger under the
//! engine's treasury account; this module moves funds in and out of it
//! and keeps the history of every movement.

use crate::error::GovernanceError;
use coffer_ledger::{BalanceLedger, LedgerError};
use coffer_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Type of treasury transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// Funds received from anyone
    Deposit,
    /// Funds paid out by a finalized proposal
    Disbursement,
}

/// Treasury transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryTransaction {
    pub tx_type: TransactionType,
    pub amount: Amount,
    /// Funder for deposits, recipient for disbursements
    pub counterparty: Address,
    /// Paying proposal (disbursements only)
    pub proposal_id: Option<u64>,
}

/// Treasury account and movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    address: Address,
    transactions: Vec<TreasuryTransaction>,
}

impl Treasury {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            transactions: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Current balance on the native ledger.
    pub fn balance<N: BalanceLedger>(&self, native: &N) -> Amount {
        native.balance_of(&self.address)
    }

    /// Pull `amount` from `source` into the treasury.
    pub fn deposit<N: BalanceLedger>(
        &self,
        native: &N,
        source: &Address,
        amount: Amount,
    ) -> Result<TreasuryTransaction, GovernanceError> {
        if *source == self.address {
            return Err(GovernanceError::TreasuryCounterparty(self.address));
        }
        native
            .transfer(source, &self.address, amount)
            .map_err(GovernanceError::FundingFailed)?;

        Ok(TreasuryTransaction {
            tx_type: TransactionType::Deposit,
            amount,
            counterparty: *source,
            proposal_id: None,
        })
    }

    /// Pay `amount` to `recipient`. Fails without effect if the treasury is short.
    pub fn disburse<N: BalanceLedger>(
        &self,
        native: &N,
        recipient: &Address,
        amount: Amount,
        proposal_id: u64,
    ) -> Result<TreasuryTransaction, GovernanceError> {
        if *recipient == self.address {
            return Err(GovernanceError::TreasuryCounterparty(self.address));
        }
        native
            .transfer(&self.address, recipient, amount)
            .map_err(|e| match e {
                LedgerError::InsufficientFunds { needed, available } => {
                    GovernanceError::InsufficientTreasuryFunds { needed, available }
                }
                other => GovernanceError::Ledger(other),
            })?;

        Ok(TreasuryTransaction {
            tx_type: TransactionType::Disbursement,
            amount,
            counterparty: *recipient,
            proposal_id: Some(proposal_id),
        })
    }

    /// Append a completed movement to the history.
    pub fn record(&mut self, tx: TreasuryTransaction) {
        self.transactions.push(tx);
    }

    pub fn transactions(&self) -> &[TreasuryTransaction] {
        &self.transactions
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_of(TransactionType::Deposit)
    }

    pub fn total_disbursed(&self) -> Amount {
        self.total_of(TransactionType::Disbursement)
    }

    fn total_of(&self, tx_type: TransactionType) -> Amount {
        self.transactions
            .iter()
            .filter(|tx| tx.tx_type == tx_type)
            .map(|tx| tx.amount)
            .sum()
    }
}
