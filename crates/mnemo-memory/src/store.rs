//! The [`MemoryStore`] contract shared by every backend.

use mnemo_types::{MnemoError, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::json::JsonStore;
use crate::sqlite::SqliteStore;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from memory store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed memory document: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for MnemoError {
    fn from(e: StoreError) -> Self {
        MnemoError::Store(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// A persistent, ordered collection of [`Record`]s.
///
/// `save` is a full replace. There is no cross-process locking; two
/// processes writing the same store will lose each other's records.
pub trait MemoryStore {
    /// Load every stored record, oldest first.
    fn load(&self) -> Result<Vec<Record>, StoreError>;

    /// Replace the stored collection with `records`.
    fn save(&self, records: &[Record]) -> Result<(), StoreError>;

    /// Add a single record to the end of the collection.
    ///
    /// The default reloads, pushes and rewrites everything.
    fn append(&self, record: &Record) -> Result<(), StoreError> {
        let mut all = self.load()?;
        all.push(record.clone());
        self.save(&all)
    }

    /// Short human-readable location, e.g. `sqlite:/home/me/.mnemo/memory.db`.
    fn describe(&self) -> String;
}

impl<S: MemoryStore + ?Sized> MemoryStore for Box<S> {
    fn load(&self) -> Result<Vec<Record>, StoreError> {
        (**self).load()
    }

    fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        (**self).save(records)
    }

    fn append(&self, record: &Record) -> Result<(), StoreError> {
        (**self).append(record)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend selection
// ─────────────────────────────────────────────────────────────────────────────

/// Which storage strategy backs the memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Json,
    #[default]
    Sqlite,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Json => write!(f, "json"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Open the store for `backend` at `path`.
pub fn open_store(backend: StoreBackend, path: &Path) -> Box<dyn MemoryStore> {
    match backend {
        StoreBackend::Json => Box::new(JsonStore::new(path)),
        StoreBackend::Sqlite => Box::new(SqliteStore::new(path)),
    }
}
