//! In-process balance ledger.

use crate::{settle, BalanceLedger, LedgerError};
use coffer_types::{Address, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Balance ledger held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: RwLock<HashMap<Address, Amount>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with initial balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, Amount)>) -> Self {
        let ledger = Self::new();
        {
            let mut map = ledger.balances.write();
            for (who, balance) in balances {
                map.insert(who, balance);
            }
        }
        ledger
    }

    /// Create new units out of thin air.
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut balances = self.balances.write();
        let balance = balances.entry(*to).or_default();
        *balance = balance.checked_add(&amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

impl BalanceLedger for MemoryLedger {
    fn balance_of(&self, who: &Address) -> Amount {
        self.balances.read().get(who).copied().unwrap_or(Amount::ZERO)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut balances = self.balances.write();
        let from_balance = balances.get(from).copied().unwrap_or(Amount::ZERO);

        if from == to {
            return settle(from_balance, Amount::ZERO, amount).map(|_| ());
        }

        let to_balance = balances.get(to).copied().unwrap_or(Amount::ZERO);
        let (debited, credited) = settle(from_balance, to_balance, amount)?;
        balances.insert(*from, debited);
        balances.insert(*to, credited);

        tracing::debug!("transfer {} from {} to {}", amount, from, to);
        Ok(())
    }

    fn holders(&self) -> Vec<(Address, Amount)> {
        let mut holders: Vec<_> = self
            .balances
            .read()
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(who, balance)| (*who, *balance))
            .collect();
        holders.sort();
        holders
    }
}
