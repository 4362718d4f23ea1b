//! Dangling reference detection and repair
//!
//! Works on the global reference index. Every entry is classified by the
//! state of the record it points to; entries pointing to missing records or
//! to offline versions are repairable when they are managed references,
//! everything else is reported for manual follow-up.

mod entry;
mod repairer;
mod scanner;
mod service;

pub use entry::{NewReference, ReferenceEntry, TargetLiveness, FILE_TABLE};
pub use repairer::{ReferenceRepairer, RepairStats};
pub use scanner::{classify, ReferenceIndexScanner};
pub use service::MissingRelationsService;

use serde::Serialize;
use std::collections::BTreeMap;

/// Entries of one finding category, grouped by referenced record
/// (`table:uid`) and keyed by entry hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceBucket {
    groups: BTreeMap<String, BTreeMap<String, ReferenceEntry>>,
}

impl ReferenceBucket {
    pub fn insert(&mut self, entry: ReferenceEntry) {
        self.groups
            .entry(entry.target_key())
            .or_default()
            .insert(entry.hash.clone(), entry);
    }

    /// Number of entries over all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in target key order
    pub fn groups(&self) -> impl Iterator<Item = (&str, Vec<&ReferenceEntry>)> {
        self.groups
            .iter()
            .map(|(target, entries)| (target.as_str(), entries.values().collect()))
    }

    /// All entries in target key, then hash order
    pub fn entries(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.groups.values().flat_map(BTreeMap::values)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.groups.values().any(|entries| entries.contains_key(hash))
    }
}

/// Result of a reference index scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceFindings {
    /// Managed references to records that do not exist (repairable)
    pub missing: ReferenceBucket,
    /// Soft references to records that do not exist
    pub missing_soft: ReferenceBucket,
    /// Managed references to offline versions (repairable)
    pub offline_duplicates: ReferenceBucket,
    /// Soft references to offline versions
    pub offline_duplicates_soft: ReferenceBucket,
    /// Managed references to soft-deleted records
    pub soft_deleted: ReferenceBucket,
    /// Soft references to soft-deleted records
    pub soft_deleted_soft: ReferenceBucket,
    /// Entries pointing to live records
    pub live: usize,
}

impl ReferenceFindings {
    /// Put an entry into the bucket matching its classification
    pub fn record(&mut self, liveness: TargetLiveness, entry: ReferenceEntry) {
        let soft = entry.is_soft_reference();
        match self.bucket_mut(liveness, soft) {
            Some(bucket) => bucket.insert(entry),
            None => self.live += 1,
        }
    }

    /// The bucket for a classification; `None` for live targets
    pub fn bucket(&self, liveness: TargetLiveness, soft: bool) -> Option<&ReferenceBucket> {
        match (liveness, soft) {
            (TargetLiveness::Live, _) => None,
            (TargetLiveness::Missing, false) => Some(&self.missing),
            (TargetLiveness::Missing, true) => Some(&self.missing_soft),
            (TargetLiveness::OfflineDuplicate, false) => Some(&self.offline_duplicates),
            (TargetLiveness::OfflineDuplicate, true) => Some(&self.offline_duplicates_soft),
            (TargetLiveness::SoftDeleted, false) => Some(&self.soft_deleted),
            (TargetLiveness::SoftDeleted, true) => Some(&self.soft_deleted_soft),
        }
    }

    fn bucket_mut(&mut self, liveness: TargetLiveness, soft: bool) -> Option<&mut ReferenceBucket> {
        match (liveness, soft) {
            (TargetLiveness::Live, _) => None,
            (TargetLiveness::Missing, false) => Some(&mut self.missing),
            (TargetLiveness::Missing, true) => Some(&mut self.missing_soft),
            (TargetLiveness::OfflineDuplicate, false) => Some(&mut self.offline_duplicates),
            (TargetLiveness::OfflineDuplicate, true) => Some(&mut self.offline_duplicates_soft),
            (TargetLiveness::SoftDeleted, false) => Some(&mut self.soft_deleted),
            (TargetLiveness::SoftDeleted, true) => Some(&mut self.soft_deleted_soft),
        }
    }

    /// Entries that can be repaired automatically
    pub fn actionable(&self) -> usize {
        self.missing.len() + self.offline_duplicates.len()
    }

    /// Entries in any bucket
    pub fn flagged(&self) -> usize {
        self.missing.len()
            + self.missing_soft.len()
            + self.offline_duplicates.len()
            + self.offline_duplicates_soft.len()
            + self.soft_deleted.len()
            + self.soft_deleted_soft.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(hash: &str, target_uid: i64, soft: bool) -> ReferenceEntry {
        ReferenceEntry {
            source_table: "tt_content".into(),
            source_uid: 1,
            field: "records".into(),
            flex_pointer: None,
            soft_reference_key: soft.then(|| "typolink".to_string()),
            hash: hash.into(),
            target_table: "pages".into(),
            target_uid,
            source_deleted: false,
        }
    }

    #[test]
    fn test_bucket_groups_by_target() {
        let mut bucket = ReferenceBucket::default();
        bucket.insert(entry("b", 2, false));
        bucket.insert(entry("a", 2, false));
        bucket.insert(entry("c", 10, false));

        assert_eq!(bucket.len(), 3);
        let groups: Vec<(&str, usize)> = bucket.groups().map(|(t, e)| (t, e.len())).collect();
        assert_eq!(groups, vec![("pages:10", 1), ("pages:2", 2)]);
        let hashes: Vec<&str> = bucket.entries().map(|e| e.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c", "a", "b"]);
        assert!(bucket.contains("a"));
        assert!(!bucket.contains("z"));
    }

    #[test]
    fn test_record_routes_by_liveness_and_kind() {
        let mut findings = ReferenceFindings::default();
        findings.record(TargetLiveness::Missing, entry("1", 1, false));
        findings.record(TargetLiveness::Missing, entry("2", 1, true));
        findings.record(TargetLiveness::OfflineDuplicate, entry("3", 1, false));
        findings.record(TargetLiveness::SoftDeleted, entry("4", 1, true));
        findings.record(TargetLiveness::Live, entry("5", 1, false));

        assert_eq!(findings.missing.len(), 1);
        assert_eq!(findings.missing_soft.len(), 1);
        assert_eq!(findings.offline_duplicates.len(), 1);
        assert_eq!(findings.soft_deleted_soft.len(), 1);
        assert_eq!(findings.live, 1);
        assert_eq!(findings.actionable(), 2);
        assert_eq!(findings.flagged(), 4);
        assert!(findings.bucket(TargetLiveness::Live, false).is_none());
    }

    fn liveness() -> impl Strategy<Value = TargetLiveness> {
        prop_oneof![
            Just(TargetLiveness::Live),
            Just(TargetLiveness::Missing),
            Just(TargetLiveness::SoftDeleted),
            Just(TargetLiveness::OfflineDuplicate),
        ]
    }

    proptest! {
        #[test]
        fn prop_every_entry_lands_in_exactly_one_place(
            classified in proptest::collection::vec((liveness(), any::<bool>(), 1i64..5), 0..40)
        ) {
            let mut findings = ReferenceFindings::default();
            for (i, (state, soft, target)) in classified.iter().enumerate() {
                findings.record(*state, entry(&format!("h{:02}", i), *target, *soft));
            }

            prop_assert_eq!(findings.flagged() + findings.live, classified.len());
            for (i, (state, soft, _)) in classified.iter().enumerate() {
                let hash = format!("h{:02}", i);
                if let Some(bucket) = findings.bucket(*state, *soft) {
                    prop_assert!(bucket.contains(&hash));
                }
            }
        }
    }
}
