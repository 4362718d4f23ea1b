//! Detection of duplicated and dangling join rows

use super::{
    CorruptFindingSet, RelationDefinition, Violation, FOREIGN_KEY_COLUMN, LOCAL_KEY_COLUMN,
};
use crate::db::{DataStore, Row, Value};
use crate::error::{CleanupError, Result};
use std::collections::BTreeMap;

/// Scans join tables for corrupt rows
pub struct CorruptRelationDetector<'a> {
    store: &'a dyn DataStore,
}

impl<'a> CorruptRelationDetector<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Inspect every join table of the given relations
    pub fn detect(
        &self,
        definitions: &BTreeMap<String, RelationDefinition>,
    ) -> Result<CorruptFindingSet> {
        let mut findings = CorruptFindingSet::default();

        for definition in definitions.values() {
            let before = findings.affected_rows;
            self.inspect(definition, &mut findings)?;

            let flagged = findings.affected_rows - before;
            if flagged > 0 {
                findings.affected_tables += 1;
                tracing::debug!(join_table = %definition.join_table, flagged, "corrupt join rows found");
            }
        }

        Ok(findings)
    }

    fn inspect(
        &self,
        definition: &RelationDefinition,
        findings: &mut CorruptFindingSet,
    ) -> Result<()> {
        let rows = self.store.fetch_all(&definition.join_table)?;
        let Some(first) = rows.first() else {
            return Ok(());
        };
        if first.get(LOCAL_KEY_COLUMN).is_none() || first.get(FOREIGN_KEY_COLUMN).is_none() {
            return Err(CleanupError::Schema(format!(
                "join table {} has no {}/{} column",
                definition.join_table, LOCAL_KEY_COLUMN, FOREIGN_KEY_COLUMN
            )));
        }

        // Rows already flagged as the later half of a duplicate pair
        let mut consumed = vec![false; rows.len()];

        for i in 0..rows.len() {
            if consumed[i] {
                continue;
            }
            let row = &rows[i];
            let pair = relation_pair(row);

            let mut duplicated = false;
            for j in (i + 1)..rows.len() {
                if consumed[j] || relation_pair(&rows[j]) != pair {
                    continue;
                }
                if !duplicated {
                    findings.flag(&definition.join_table, row, Violation::Duplicate);
                    duplicated = true;
                }
                findings.flag(&definition.join_table, &rows[j], Violation::Duplicate);
                consumed[j] = true;
            }

            if !self.exists(&definition.local_table, pair.0)? {
                findings.flag(&definition.join_table, row, Violation::MissingLocal);
            }
            if !self.exists(&definition.foreign_table, pair.1)? {
                findings.flag(&definition.join_table, row, Violation::MissingForeign);
            }
        }

        Ok(())
    }

    fn exists(&self, table: &str, uid: Option<&Value>) -> Result<bool> {
        match uid {
            Some(uid) => self.store.record_exists(table, uid),
            None => Ok(false),
        }
    }
}

fn relation_pair(row: &Row) -> (Option<&Value>, Option<&Value>) {
    (row.get(LOCAL_KEY_COLUMN), row.get(FOREIGN_KEY_COLUMN))
}
