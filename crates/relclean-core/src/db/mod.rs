//! Database layer for relclean
//!
//! Provides SQLite-based storage with:
//! - generic row access to the managed tables
//! - the global reference index (`sys_refindex`)
//! - persisted execution logs

mod logs;
mod refindex;
mod rows;
mod schema;
mod store;

pub use logs::LogSummary;
pub use refindex::{hash_reference, REFERENCE_INDEX_TABLE};
pub use rows::{quote_identifier, value_to_json, value_to_string, Row, UID_COLUMN};
pub use rusqlite::types::Value;
pub use schema::Database;
pub use store::DataStore;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("data.sqlite")
    }
}
