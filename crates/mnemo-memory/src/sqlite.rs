//! SQLite memory store.
//!
//! # Storage layout
//!
//! A single table `memory` is created (if it does not already exist):
//!
//! | column         | type    | description                                 |
//! |----------------|---------|---------------------------------------------|
//! | id             | INTEGER | autoincrement primary key, insertion order  |
//! | question       | TEXT    | normalized question                         |
//! | answer         | TEXT    | stored answer                               |
//! | processed_info | TEXT    | feature bag, nullable                       |
//!
//! Databases written before the feature column existed are migrated with an
//! `ALTER TABLE` on open.
//!
//! A file-backed store opens a fresh connection for every call. `save`
//! deletes every row and re-inserts inside one transaction.
//!
//! # Example
//!
//! ```rust
//! use mnemo_memory::{MemoryStore, SqliteStore};
//! use mnemo_types::Record;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! store.append(&Record::new("who wrote hamlet", "Shakespeare")).unwrap();
//!
//! let all = store.load().unwrap();
//! assert_eq!(all[0].question, "Who wrote hamlet?");
//! ```

use mnemo_types::Record;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::store::{MemoryStore, StoreError};

enum Backing {
    File(PathBuf),
    Memory(Connection),
}

/// SQLite-backed [`MemoryStore`].
pub struct SqliteStore {
    backing: Backing,
}

impl SqliteStore {
    /// A store backed by the database file at `path`.
    ///
    /// Nothing is opened until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
        }
    }

    /// Open a temporary in-memory database (useful for testing).
    ///
    /// The connection lives as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            backing: Backing::Memory(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match &self.backing {
            Backing::Memory(conn) => f(conn),
            Backing::File(path) => {
                let conn = open_file(path)?;
                f(&conn)
            }
        }
    }
}

fn open_file(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS memory (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            question       TEXT NOT NULL,
            answer         TEXT NOT NULL,
            processed_info TEXT
        );",
    )?;

    let mut stmt = conn.prepare("PRAGMA table_info(memory)")?;
    let has_features = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .any(|name| name == "processed_info");
    if !has_features {
        debug!("adding processed_info column to legacy memory table");
        conn.execute_batch("ALTER TABLE memory ADD COLUMN processed_info TEXT;")?;
    }
    Ok(())
}

fn insert(conn: &Connection, record: &Record) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO memory (question, answer, processed_info) VALUES (?1, ?2, ?3)",
        params![record.question, record.answer, record.derived_features],
    )?;
    Ok(())
}

impl MemoryStore for SqliteStore {
    fn load(&self) -> Result<Vec<Record>, StoreError> {
        let records = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT question, answer, processed_info FROM memory ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Record {
                    question: row.get(0)?,
                    answer: row.get(1)?,
                    derived_features: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })?;
        info!(store = %self.describe(), records = records.len(), "memory loaded");
        Ok(records)
    }

    fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM memory", [])?;
            for record in records {
                insert(&tx, record)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        info!(store = %self.describe(), records = records.len(), "memory saved");
        Ok(())
    }

    fn append(&self, record: &Record) -> Result<(), StoreError> {
        self.with_conn(|conn| insert(conn, record))?;
        debug!(question = %record.question, "record appended");
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.backing {
            Backing::File(path) => format!("sqlite:{}", path.display()),
            Backing::Memory(_) => "sqlite::memory:".to_string(),
        }
    }
}
