//! Whole-file JSON memory store.
//!
//! The document looks like:
//!
//! ```json
//! { "memory": [ { "question": "Who wrote Hamlet?", "answer": "Shakespeare" } ] }
//! ```
//!
//! Every save rewrites the whole document. The new contents are written to
//! a sibling `*.tmp` file and renamed over the target so a crash mid-write
//! leaves the previous document intact.

use mnemo_types::Record;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::store::{MemoryStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryDocument {
    #[serde(default)]
    memory: Vec<Record>,
}

/// JSON-document backed [`MemoryStore`].
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl MemoryStore for JsonStore {
    fn load(&self) -> Result<Vec<Record>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "memory document absent, starting empty");
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let doc: MemoryDocument = serde_json::from_str(&raw)?;
        info!(path = %self.path.display(), records = doc.memory.len(), "memory loaded");
        Ok(doc.memory)
    }

    fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let doc = MemoryDocument {
            memory: records.to_vec(),
        };
        let raw = serde_json::to_string_pretty(&doc)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, raw).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;

        info!(path = %self.path.display(), records = records.len(), "memory saved");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::new(dir.path().join("memory.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn empty_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let records = vec![
            Record::new("What is the capital of France?", "Paris").with_features("be capital france"),
            Record::new("Who wrote Hamlet?", "Shakespeare"),
        ];
        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&[Record::new("a", "1"), Record::new("b", "2")]).unwrap();
        store.save(&[Record::new("c", "3")]).unwrap();
        let all = store.load().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].question, "C?");
    }

    #[test]
    fn reads_document_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"memory":[{"question":"What is the capital of France?","answer":"Paris"}]}"#,
        )
        .unwrap();
        let all = store.load().unwrap();
        assert_eq!(all[0].answer, "Paris");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load().unwrap_err(), StoreError::Json(_)));
    }

    #[test]
    fn save_creates_parent_directory_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested").join("memory.json"));
        store.save(&[Record::new("q", "a")]).unwrap();
        assert!(store.path().exists());
        assert!(!dir.path().join("nested").join("memory.json.tmp").exists());
    }
}
