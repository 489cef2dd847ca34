use coffer_storage::StorageError;
use coffer_types::Amount;
use thiserror::Error;

/// Errors raised by balance ledgers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("Balance overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
