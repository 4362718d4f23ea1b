//! Classification of reference index entries

use super::{ReferenceFindings, TargetLiveness};
use crate::db::{DataStore, Row, UID_COLUMN};
use crate::error::Result;
use crate::schema::{SchemaProvider, TableSchema, VERSION_ORIGIN_COLUMN, VERSION_WORKSPACE_COLUMN};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Reads the reference index and resolves every referenced record
pub struct ReferenceIndexScanner<'a> {
    store: &'a dyn DataStore,
    schema: &'a dyn SchemaProvider,
}

impl<'a> ReferenceIndexScanner<'a> {
    pub fn new(store: &'a dyn DataStore, schema: &'a dyn SchemaProvider) -> Self {
        Self { store, schema }
    }

    /// Classify every record reference of the index. Read-only.
    pub fn scan(&self) -> Result<ReferenceFindings> {
        let entries = self.store.reference_entries()?;
        let total = entries.len();
        let mut records: HashMap<(String, i64), Option<Row>> = HashMap::new();
        let mut findings = ReferenceFindings::default();

        for entry in entries {
            let key = (entry.target_table.clone(), entry.target_uid);
            let record = match records.entry(key) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let resolved = self.resolve(&entry.target_table, entry.target_uid)?;
                    e.insert(resolved)
                }
            };

            let liveness = classify(record.as_ref(), self.schema.table(&entry.target_table));
            findings.record(liveness, entry);
        }

        tracing::debug!(
            total,
            resolved = records.len(),
            flagged = findings.flagged(),
            "reference index scanned"
        );
        Ok(findings)
    }

    fn resolve(&self, table: &str, uid: i64) -> Result<Option<Row>> {
        let mut columns = vec![UID_COLUMN, "pid"];
        let table_schema = self.schema.table(table);
        if let Some(delete_column) = table_schema.and_then(|t| t.delete_column.as_deref()) {
            columns.push(delete_column);
        }
        if table_schema.is_some_and(|t| t.versioned) {
            columns.push(VERSION_ORIGIN_COLUMN);
            columns.push(VERSION_WORKSPACE_COLUMN);
        }
        self.store.fetch_record(table, uid, &columns)
    }
}

/// Liveness of a referenced record.
///
/// A version copy is reported as such even when it is also soft-deleted.
pub fn classify(record: Option<&Row>, table: Option<&TableSchema>) -> TargetLiveness {
    let Some(record) = record else {
        return TargetLiveness::Missing;
    };

    if record.get_i64(VERSION_ORIGIN_COLUMN).unwrap_or(0) > 0 {
        return TargetLiveness::OfflineDuplicate;
    }

    let deleted = table
        .and_then(|t| t.delete_column.as_deref())
        .and_then(|column| record.get_i64(column))
        .unwrap_or(0);
    if deleted != 0 {
        TargetLiveness::SoftDeleted
    } else {
        TargetLiveness::Live
    }
}
