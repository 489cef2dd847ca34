//! Coffer Types - Value types shared by every Coffer crate.
//!
//! - Addresses (20-byte, Bech32m encoded with the `cof` prefix)
//! - Amounts (128-bit unsigned token and native-currency quantities)

pub mod address;
pub mod amount;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use amount::Amount;
pub use error::TypesError;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, Amount, TypesError};
}
