//! Coffer Ledger - Balance ledger collaborator.
//!
//! The governance engine only ever consumes [`BalanceLedger`]: balance
//! lookups, atomic transfers, and a holder listing for snapshots.
//! Seeding balances (`mint`) belongs to the concrete ledgers.

pub mod error;
pub mod memory;
pub mod persistent;

pub use error::LedgerError;
pub use memory::MemoryLedger;
pub use persistent::LedgerDb;

use coffer_types::{Address, Amount};
use std::sync::Arc;

/// Fungible balance ledger.
pub trait BalanceLedger: Send + Sync {
    /// Current balance (zero for unknown addresses).
    fn balance_of(&self, who: &Address) -> Amount;

    /// Move `amount` from `from` to `to`, all or nothing.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Every address with a positive balance.
    fn holders(&self) -> Vec<(Address, Amount)>;

    fn total_supply(&self) -> Amount {
        self.holders().into_iter().map(|(_, balance)| balance).sum()
    }
}

impl<L: BalanceLedger + ?Sized> BalanceLedger for Arc<L> {
    fn balance_of(&self, who: &Address) -> Amount {
        (**self).balance_of(who)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        (**self).transfer(from, to, amount)
    }

    fn holders(&self) -> Vec<(Address, Amount)> {
        (**self).holders()
    }
}

/// New balances for both sides of a transfer, or why it cannot happen.
pub(crate) fn settle(
    from_balance: Amount,
    to_balance: Amount,
    amount: Amount,
) -> Result<(Amount, Amount), LedgerError> {
    let debited = from_balance
        .checked_sub(&amount)
        .ok_or(LedgerError::InsufficientFunds {
            needed: amount,
            available: from_balance,
        })?;
    let credited = to_balance.checked_add(&amount).ok_or(LedgerError::Overflow)?;
    Ok((debited, credited))
}
