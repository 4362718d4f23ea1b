//! Database handle and bookkeeping tables

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Main database handle
pub struct Database {
    pub(crate) conn: Connection,
}

const SCHEMA_VERSION: i32 = 1;

const CREATE_TABLES: &str = r#"
-- Global reference index (managed and soft references between records)
CREATE TABLE IF NOT EXISTS sys_refindex (
    hash TEXT PRIMARY KEY,
    tablename TEXT NOT NULL DEFAULT '',
    recuid INTEGER NOT NULL DEFAULT 0,
    field TEXT NOT NULL DEFAULT '',
    flexpointer TEXT NOT NULL DEFAULT '',
    softref_key TEXT NOT NULL DEFAULT '',
    softref_id TEXT NOT NULL DEFAULT '',
    sorting INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    ref_table TEXT NOT NULL DEFAULT '',
    ref_uid INTEGER NOT NULL DEFAULT 0,
    ref_string TEXT NOT NULL DEFAULT ''
);

-- Execution logs of cleanup runs
CREATE TABLE IF NOT EXISTS cleanup_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    service TEXT NOT NULL,
    created_at TEXT NOT NULL,
    created_by INTEGER
);

CREATE TABLE IF NOT EXISTS cleanup_log_message (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_id INTEGER NOT NULL REFERENCES cleanup_log(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    message TEXT,
    key TEXT,
    arguments TEXT
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_refindex_ref ON sys_refindex(ref_table, ref_uid);
CREATE INDEX IF NOT EXISTS idx_refindex_source ON sys_refindex(tablename, recuid);
CREATE INDEX IF NOT EXISTS idx_log_message_log ON cleanup_log_message(log_id);
CREATE INDEX IF NOT EXISTS idx_log_created ON cleanup_log(created_at);
"#;

impl Database {
    /// Open database at path, creating if necessary
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Initialize bookkeeping tables
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        self.conn.execute_batch(CREATE_TABLES)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<Option<i32>> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();
        Ok(version)
    }

    /// Run raw SQL statements against the managed database
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Check whether a table exists
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Column names of a table, in declaration order; empty for a missing table
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(params![table], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(columns)
    }
}
