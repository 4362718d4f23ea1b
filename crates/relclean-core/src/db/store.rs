//! Store abstraction used by the cleanup services

use super::{Database, Row};
use crate::error::Result;
use crate::references::ReferenceEntry;
use rusqlite::types::Value;

/// Query and mutation primitives the detectors and repairers rely on
pub trait DataStore {
    /// Every row of a table
    fn fetch_all(&self, table: &str) -> Result<Vec<Row>>;

    /// Does a row with this uid exist
    fn record_exists(&self, table: &str, uid: &Value) -> Result<bool>;

    /// Delete rows equal to `row` on every column, returning the number deleted
    fn delete_matching(&self, table: &str, row: &Row) -> Result<usize>;

    /// Reference index entries pointing to records with a positive uid
    fn reference_entries(&self) -> Result<Vec<ReferenceEntry>>;

    /// Selected columns of one row
    fn fetch_record(&self, table: &str, uid: i64, columns: &[&str]) -> Result<Option<Row>>;

    /// Point the reference identified by `hash` at `value`, or remove it
    fn set_reference_value(&self, hash: &str, value: Option<i64>) -> Result<()>;
}

impl DataStore for Database {
    fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        Database::fetch_all(self, table)
    }

    fn record_exists(&self, table: &str, uid: &Value) -> Result<bool> {
        Database::record_exists(self, table, uid)
    }

    fn delete_matching(&self, table: &str, row: &Row) -> Result<usize> {
        Database::delete_matching(self, table, row)
    }

    fn reference_entries(&self) -> Result<Vec<ReferenceEntry>> {
        Database::reference_entries(self)
    }

    fn fetch_record(&self, table: &str, uid: i64, columns: &[&str]) -> Result<Option<Row>> {
        Database::fetch_record(self, table, uid, columns)
    }

    fn set_reference_value(&self, hash: &str, value: Option<i64>) -> Result<()> {
        Database::set_reference_value(self, hash, value)
    }
}
