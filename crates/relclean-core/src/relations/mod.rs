//! Corrupt M:N relation detection and repair
//!
//! Join tables carry no identity column. Rows are identified by their
//! `(uid_local, uid_foreign)` pair for duplicate detection, and by the
//! values of all their columns when they are deleted.

mod detector;
mod indexer;
mod repairer;
mod service;

pub use detector::CorruptRelationDetector;
pub use indexer::RelationSchemaIndexer;
pub use repairer::CorruptRelationRepairer;
pub use service::CorruptRelationsService;

use crate::db::Row;
use serde::Serialize;
use std::collections::BTreeMap;

/// Join table column referencing the local record
pub const LOCAL_KEY_COLUMN: &str = "uid_local";

/// Join table column referencing the foreign record
pub const FOREIGN_KEY_COLUMN: &str = "uid_foreign";

/// An M:N relation as declared from its local side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDefinition {
    pub join_table: String,
    pub local_table: String,
    pub foreign_table: String,
}

/// Why a join row was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Another row carries the same `(uid_local, uid_foreign)` pair
    Duplicate,
    /// `uid_local` matches no row of the local table
    MissingLocal,
    /// `uid_foreign` matches no row of the foreign table
    MissingForeign,
}

/// A join row together with the rule it violates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedRow {
    pub violation: Violation,
    pub row: Row,
}

/// Flagged join rows per join table.
///
/// A row is listed once per violation, so `affected_rows` counts violation
/// occurrences rather than distinct rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorruptFindingSet {
    pub tables: BTreeMap<String, Vec<FlaggedRow>>,
    pub affected_tables: usize,
    pub affected_rows: usize,
}

impl CorruptFindingSet {
    pub fn is_empty(&self) -> bool {
        self.affected_rows == 0
    }

    /// Flagged rows of one join table
    pub fn rows(&self, join_table: &str) -> &[FlaggedRow] {
        self.tables
            .get(join_table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of occurrences of a given violation over all tables
    pub fn count(&self, violation: Violation) -> usize {
        self.tables
            .values()
            .flatten()
            .filter(|f| f.violation == violation)
            .count()
    }

    fn flag(&mut self, join_table: &str, row: &Row, violation: Violation) {
        self.tables
            .entry(join_table.to_string())
            .or_default()
            .push(FlaggedRow {
                violation,
                row: row.clone(),
            });
        self.affected_rows += 1;
    }
}
