//! Coffer Storage - Persistent storage with JSON files

pub mod db;
pub mod error;

pub use db::{Database, WriteBatch};
pub use error::StorageError;
