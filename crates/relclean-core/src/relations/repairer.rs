//! Deletion of corrupt join rows

use super::CorruptFindingSet;
use crate::db::DataStore;
use crate::error::Result;
use crate::service::{self, Journal, Outcome};

pub(crate) const DELETED_ONE_KEY: &str = "corrupt_relations.deleted.one";
pub(crate) const DELETED_OTHER_KEY: &str = "corrupt_relations.deleted.other";

/// Removes flagged join rows
pub struct CorruptRelationRepairer<'a> {
    store: &'a dyn DataStore,
}

impl<'a> CorruptRelationRepairer<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Delete every flagged row, matching on all of its columns.
    ///
    /// Join tables have no identity column, so any other row identical to a
    /// flagged one on every column is deleted as well.
    pub fn repair(&self, findings: &CorruptFindingSet, journal: &mut Journal<'_>) -> Result<Outcome> {
        for (join_table, flagged) in &findings.tables {
            let mut deleted = 0usize;
            for entry in flagged {
                deleted += self.store.delete_matching(join_table, &entry.row)?;
            }

            tracing::info!(
                join_table = %join_table,
                flagged = flagged.len(),
                deleted,
                "corrupt join rows removed"
            );

            let key = if flagged.len() == 1 {
                DELETED_ONE_KEY
            } else {
                DELETED_OTHER_KEY
            };
            journal.add_localized(key, &[flagged.len().to_string(), join_table.clone()]);
        }

        Ok(service::success(journal.localizer(), None))
    }
}
