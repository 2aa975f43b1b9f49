//! `mnemo-memory` – The Question Store.
//!
//! Persists question/answer [`Record`][mnemo_types::Record]s between
//! sessions. The whole collection is loaded at session start and `save`
//! always replaces it in full.
//!
//! # Modules
//!
//! - [`store`] – the [`MemoryStore`][store::MemoryStore] contract,
//!   [`StoreError`][store::StoreError] and backend selection.
//! - [`json`] – [`JsonStore`][json::JsonStore]: a single JSON document
//!   holding every record under a top-level `"memory"` key.
//! - [`sqlite`] – [`SqliteStore`][sqlite::SqliteStore]: an embedded SQLite
//!   table `memory(id, question, answer, processed_info)`.

pub mod json;
pub mod sqlite;
pub mod store;

pub use json::JsonStore;
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, StoreBackend, StoreError, open_store};
