//! Reference index entries

use serde::Serialize;

/// Pseudo table name used by the index for file references
pub const FILE_TABLE: &str = "_FILE";

/// One row of the global reference index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    /// Table of the record holding the reference
    pub source_table: String,
    pub source_uid: i64,
    pub field: String,
    pub flex_pointer: Option<String>,
    pub soft_reference_key: Option<String>,
    /// Stable per-entry identifier used for targeted updates
    pub hash: String,
    pub target_table: String,
    pub target_uid: i64,
    /// The referencing record is itself soft-deleted
    pub source_deleted: bool,
}

impl ReferenceEntry {
    pub fn is_soft_reference(&self) -> bool {
        self.soft_reference_key.is_some()
    }

    /// `table:uid` of the referenced record
    pub fn target_key(&self) -> String {
        format!("{}:{}", self.target_table, self.target_uid)
    }

    /// Human readable location of the reference, e.g.
    /// `tt_content:12:bodytext:typolink (Soft Reference)  (DELETED)`
    pub fn describe(&self) -> String {
        let mut out = format!("{}:{}:{}", self.source_table, self.source_uid, self.field);
        if let Some(ref pointer) = self.flex_pointer {
            out.push(':');
            out.push_str(pointer);
        }
        if let Some(ref key) = self.soft_reference_key {
            out.push(':');
            out.push_str(key);
            out.push_str(" (Soft Reference) ");
        }
        if self.source_deleted {
            out.push_str(" (DELETED)");
        }
        out
    }
}

/// A reference to be recorded in the index
#[derive(Debug, Clone, Default)]
pub struct NewReference {
    pub source_table: String,
    pub source_uid: i64,
    pub field: String,
    pub flex_pointer: Option<String>,
    pub soft_reference_key: Option<String>,
    pub sorting: i64,
    pub target_table: String,
    pub target_uid: i64,
    pub source_deleted: bool,
}

impl NewReference {
    /// Managed reference from `source_table:source_uid:field` to `target_table:target_uid`
    pub fn managed(
        source_table: impl Into<String>,
        source_uid: i64,
        field: impl Into<String>,
        target_table: impl Into<String>,
        target_uid: i64,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_uid,
            field: field.into(),
            target_table: target_table.into(),
            target_uid,
            ..Default::default()
        }
    }

    /// Turn into a soft reference found by the given parser key
    pub fn soft(mut self, key: impl Into<String>) -> Self {
        self.soft_reference_key = Some(key.into());
        self
    }

    pub fn in_flex_field(mut self, pointer: impl Into<String>) -> Self {
        self.flex_pointer = Some(pointer.into());
        self
    }

    pub fn with_sorting(mut self, sorting: i64) -> Self {
        self.sorting = sorting;
        self
    }

    pub fn from_deleted_source(mut self) -> Self {
        self.source_deleted = true;
        self
    }
}

/// Current state of a referenced record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLiveness {
    Live,
    /// No row with that uid exists
    Missing,
    /// Row exists but its delete flag is set
    SoftDeleted,
    /// Row is a version copy of another record
    OfflineDuplicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ReferenceEntry {
        ReferenceEntry {
            source_table: "tt_content".into(),
            source_uid: 12,
            field: "bodytext".into(),
            flex_pointer: None,
            soft_reference_key: None,
            hash: "abc".into(),
            target_table: "pages".into(),
            target_uid: 4,
            source_deleted: false,
        }
    }

    #[test]
    fn test_describe_managed() {
        assert_eq!(entry().describe(), "tt_content:12:bodytext");
        assert_eq!(entry().target_key(), "pages:4");
        assert!(!entry().is_soft_reference());
    }

    #[test]
    fn test_describe_soft_deleted_flex() {
        let mut e = entry();
        e.flex_pointer = Some("sDEF/lDEF/link/vDEF".into());
        e.soft_reference_key = Some("typolink".into());
        e.source_deleted = true;
        assert!(e.is_soft_reference());
        assert_eq!(
            e.describe(),
            "tt_content:12:bodytext:sDEF/lDEF/link/vDEF:typolink (Soft Reference)  (DELETED)"
        );
    }
}
