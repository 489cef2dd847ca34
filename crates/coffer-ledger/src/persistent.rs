//! Balance ledger persisted in a coffer-storage database.

use crate::{settle, BalanceLedger, LedgerError};
use coffer_storage::{Database, StorageError, WriteBatch};
use coffer_types::{Address, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

const BALANCES: &str = "balances";

/// Durable balance ledger.
///
/// Balances are cached in memory and written through on every change;
/// the cache is only updated after the write succeeded.
pub struct LedgerDb {
    db: Database,
    balances: RwLock<HashMap<Address, Amount>>,
}

impl LedgerDb {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let db = Database::open(path)?;

        let mut balances = HashMap::new();
        for key in db.keys(BALANCES)? {
            let who = Address::from_slice(&key)
                .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
            if let Some(balance) = db.get::<Amount>(BALANCES, &key)? {
                balances.insert(who, balance);
            }
        }
        tracing::info!("Loaded {} ledger accounts from {}", balances.len(), path.display());

        Ok(Self {
            db,
            balances: RwLock::new(balances),
        })
    }

    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut balances = self.balances.write();
        let current = balances.get(to).copied().unwrap_or(Amount::ZERO);
        let updated = current.checked_add(&amount).ok_or(LedgerError::Overflow)?;

        self.db.put(BALANCES, to.as_bytes(), &updated)?;
        balances.insert(*to, updated);
        Ok(())
    }
}

impl BalanceLedger for LedgerDb {
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

        let mut batch = WriteBatch::new();
        batch.put(BALANCES, from.as_bytes(), &debited)?;
        batch.put(BALANCES, to.as_bytes(), &credited)?;
        self.db.batch_write(batch)?;
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
