//! Column store backed by a single `data.json` file.
//!
//! Layout: `{ column: { hex(key): value } }`. Every write is persisted
//! before it returns; a [`WriteBatch`] lands in one file replacement.

use crate::error::StorageError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DATA_FILE: &str = "data.json";

type Columns = BTreeMap<String, BTreeMap<String, Value>>;

/// Database - JSON file-based column storage
pub struct Database {
    path: PathBuf,
    data: RwLock<Columns>,
}

impl Database {
    /// Open (or create) a database in `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(path)?;

        let data_file = path.join(DATA_FILE);
        let data = if data_file.exists() {
            let content = fs::read_to_string(&data_file)?;
            serde_json::from_str(&content).map_err(|e| {
                StorageError::Deserialization(format!("{}: {}", data_file.display(), e))
            })?
        } else {
            Columns::new()
        };

        tracing::debug!("Opened database at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
        })
    }

    /// Directory holding the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, column: &str, key: &[u8]) -> Result<Option<T>, StorageError> {
        let data = self.data.read();
        match data.get(column).and_then(|c| c.get(&hex::encode(key))) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StorageError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize + ?Sized>(&self, column: &str, key: &[u8], value: &T) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        batch.put(column, key, value)?;
        self.batch_write(batch)
    }

    pub fn delete(&self, column: &str, key: &[u8]) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        batch.delete(column, key);
        self.batch_write(batch)
    }

    /// Apply every operation of the batch, then persist once.
    ///
    /// The in-memory view only changes if the file write succeeded.
    pub fn batch_write(&self, batch: WriteBatch) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut data = self.data.write();
        let mut updated = data.clone();
        for op in batch.ops {
            match op {
                BatchOp::Put { column, key, value } => {
                    updated.entry(column).or_default().insert(key, value);
                }
                BatchOp::Delete { column, key } => {
                    if let Some(entries) = updated.get_mut(&column) {
                        entries.remove(&key);
                    }
                }
            }
        }

        self.persist(&updated)?;
        *data = updated;
        Ok(())
    }

    /// All keys in a column, sorted by their byte value.
    pub fn keys(&self, column: &str) -> Result<Vec<Vec<u8>>, StorageError> {
        let data = self.data.read();
        let mut keys = match data.get(column) {
            Some(entries) => entries
                .keys()
                .map(|k| hex::decode(k).map_err(|_| StorageError::InvalidKey(k.clone())))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        keys.sort();
        Ok(keys)
    }

    /// Write to a sibling temp file, then rename over `data.json`.
    fn persist(&self, data: &Columns) -> Result<(), StorageError> {
        let data_file = self.path.join(DATA_FILE);
        let tmp_file = self.path.join(format!("{}.tmp", DATA_FILE));
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&tmp_file, content)?;
        fs::rename(&tmp_file, &data_file)?;
        Ok(())
    }
}

enum BatchOp {
    Put { column: String, key: String, value: Value },
    Delete { column: String, key: String },
}

/// Write batch for atomic multi-column updates.
#[derive(Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a value into the batch.
    pub fn put<T: Serialize + ?Sized>(&mut self, column: &str, key: &[u8], value: &T) -> Result<(), StorageError> {
        self.ops.push(BatchOp::Put {
            column: column.to_string(),
            key: hex::encode(key),
            value: serde_json::to_value(value)?,
        });
        Ok(())
    }

    /// Delete a value in the batch.
    pub fn delete(&mut self, column: &str, key: &[u8]) {
        self.ops.push(BatchOp::Delete {
            column: column.to_string(),
            key: hex::encode(key),
        });
    }

    /// Get the batch size.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if batch is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
