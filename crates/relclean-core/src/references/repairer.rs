//! Removal of repairable references

use super::ReferenceBucket;
use crate::db::DataStore;
use crate::service::Journal;

/// Counters of a repair pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub updated: usize,
    pub failed: usize,
}

/// Nulls out references to missing records and offline versions
pub struct ReferenceRepairer<'a> {
    store: &'a dyn DataStore,
}

impl<'a> ReferenceRepairer<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Remove every reference of both buckets, offline versions first.
    ///
    /// A rejected update is logged and the pass continues; updates already
    /// applied stay in place.
    pub fn repair(
        &self,
        missing: &ReferenceBucket,
        offline_duplicates: &ReferenceBucket,
        journal: &mut Journal<'_>,
    ) -> RepairStats {
        let mut stats = RepairStats::default();

        for entry in offline_duplicates.entries().chain(missing.entries()) {
            match self.store.set_reference_value(&entry.hash, None) {
                Ok(()) => stats.updated += 1,
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(hash = %entry.hash, error = %err, "reference could not be removed");
                    journal.add_message(format!(
                        "Removing reference in record \"{}\" (Hash: {}) failed: {}",
                        entry.describe(),
                        entry.hash,
                        err
                    ));
                }
            }
        }

        tracing::info!(updated = stats.updated, failed = stats.failed, "references repaired");
        stats
    }
}
