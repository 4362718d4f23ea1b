//! Reference index operations

use super::rows::{quote_identifier, value_to_string, UID_COLUMN};
use super::Database;
use crate::error::{CleanupError, Result};
use crate::references::{NewReference, ReferenceEntry, FILE_TABLE};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

/// Name of the reference index table
pub const REFERENCE_INDEX_TABLE: &str = "sys_refindex";

const ENTRY_COLUMNS: &str =
    "ref_uid, ref_table, softref_key, hash, tablename, recuid, field, flexpointer, deleted";

/// Stable identifier of an index entry
pub fn hash_reference(reference: &NewReference) -> String {
    let mut hasher = Sha256::new();
    let parts = [
        reference.source_table.clone(),
        reference.source_uid.to_string(),
        reference.field.clone(),
        reference.flex_pointer.clone().unwrap_or_default(),
        reference.soft_reference_key.clone().unwrap_or_default(),
        reference.sorting.to_string(),
        reference.target_table.clone(),
        reference.target_uid.to_string(),
    ];
    for part in &parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\x1f");
    }
    format!("{:x}", hasher.finalize())
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceEntry> {
    let softref_key: String = row.get(2)?;
    let flexpointer: String = row.get(7)?;
    let deleted: i64 = row.get(8)?;
    Ok(ReferenceEntry {
        target_uid: row.get(0)?,
        target_table: row.get(1)?,
        soft_reference_key: (!softref_key.is_empty()).then_some(softref_key),
        hash: row.get(3)?,
        source_table: row.get(4)?,
        source_uid: row.get(5)?,
        field: row.get(6)?,
        flex_pointer: (!flexpointer.is_empty()).then_some(flexpointer),
        source_deleted: deleted != 0,
    })
}

impl Database {
    /// Record a reference in the index, returning its hash
    pub fn add_reference(&self, reference: &NewReference) -> Result<String> {
        let hash = hash_reference(reference);
        self.conn.execute(
            "INSERT OR REPLACE INTO sys_refindex
                (hash, tablename, recuid, field, flexpointer, softref_key, sorting, deleted, ref_table, ref_uid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                hash,
                reference.source_table,
                reference.source_uid,
                reference.field,
                reference.flex_pointer.as_deref().unwrap_or(""),
                reference.soft_reference_key.as_deref().unwrap_or(""),
                reference.sorting,
                reference.source_deleted as i64,
                reference.target_table,
                reference.target_uid,
            ],
        )?;
        Ok(hash)
    }

    /// Record references, pointing to records (not files) with a positive uid
    pub fn reference_entries(&self) -> Result<Vec<ReferenceEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sys_refindex
             WHERE ref_table <> ?1 AND ref_uid > ?2
             ORDER BY hash",
            ENTRY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![FILE_TABLE, 0], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Look up a single index entry
    pub fn reference_by_hash(&self, hash: &str) -> Result<Option<ReferenceEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sys_refindex WHERE hash = ?1", ENTRY_COLUMNS),
                params![hash],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Count all index entries
    pub fn reference_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM sys_refindex", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Change the value a reference points to.
    ///
    /// The referencing field is rewritten: the first list token `uid` or
    /// `table_uid` naming the target is removed (`None`) or replaced by the
    /// new uid, an integer field holding the uid becomes `0` (or the new uid).
    /// Each index entry stands for one occurrence, so a target listed twice
    /// takes two updates. The index row is dropped (`None`) or repointed.
    ///
    /// A removal whose target is no longer in the field only drops the stale
    /// index row.
    pub fn set_reference_value(&self, hash: &str, value: Option<i64>) -> Result<()> {
        let entry = self.reference_by_hash(hash)?.ok_or_else(|| {
            CleanupError::ReferenceUpdate(format!("no reference index entry with hash {}", hash))
        })?;

        if let Some(ref key) = entry.soft_reference_key {
            return Err(CleanupError::ReferenceUpdate(format!(
                "soft reference '{}' in {} can not be changed automatically",
                key,
                entry.describe()
            )));
        }
        if let Some(ref pointer) = entry.flex_pointer {
            return Err(CleanupError::ReferenceUpdate(format!(
                "references inside flexform field '{}' ({}) are not supported",
                entry.field, pointer
            )));
        }

        let record = self
            .fetch_record(&entry.source_table, entry.source_uid, &[&entry.field])?
            .ok_or_else(|| {
                CleanupError::ReferenceUpdate(format!(
                    "record {}:{} does not exist",
                    entry.source_table, entry.source_uid
                ))
            })?;
        let current = record.get(&entry.field).cloned().unwrap_or(Value::Null);
        let Some(updated) =
            replace_reference(&current, &entry.target_table, entry.target_uid, value)
        else {
            if value.is_none() {
                self.conn
                    .execute("DELETE FROM sys_refindex WHERE hash = ?1", params![hash])?;
                tracing::debug!(hash, reference = %entry.describe(), "stale reference index row removed");
                return Ok(());
            }
            return Err(CleanupError::ReferenceUpdate(format!(
                "field {} of {}:{} does not contain {} (value: {})",
                entry.field,
                entry.source_table,
                entry.source_uid,
                entry.target_key(),
                value_to_string(&current)
            )));
        };

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "UPDATE {} SET {} = ?1 WHERE {} = ?2",
                quote_identifier(&entry.source_table),
                quote_identifier(&entry.field),
                quote_identifier(UID_COLUMN)
            ),
            params![updated, entry.source_uid],
        )?;
        match value {
            None => tx.execute("DELETE FROM sys_refindex WHERE hash = ?1", params![hash])?,
            Some(uid) => tx.execute(
                "UPDATE sys_refindex SET ref_uid = ?1 WHERE hash = ?2",
                params![uid, hash],
            )?,
        };
        tx.commit()?;

        tracing::debug!(hash, reference = %entry.describe(), ?value, "reference value updated");
        Ok(())
    }
}

/// Rewrite a field value, returning `None` when the reference is not part of it
fn replace_reference(
    current: &Value,
    target_table: &str,
    target_uid: i64,
    replacement: Option<i64>,
) -> Option<Value> {
    match current {
        Value::Integer(uid) if *uid == target_uid => {
            Some(Value::Integer(replacement.unwrap_or(0)))
        }
        Value::Text(list) => {
            let plain = target_uid.to_string();
            let prefixed = format!("{}_{}", target_table, target_uid);
            let mut found = false;
            let mut tokens = Vec::new();

            for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                if found {
                    tokens.push(token.to_string());
                } else if token == plain {
                    found = true;
                    if let Some(uid) = replacement {
                        tokens.push(uid.to_string());
                    }
                } else if token == prefixed {
                    found = true;
                    if let Some(uid) = replacement {
                        tokens.push(format!("{}_{}", target_table, uid));
                    }
                } else {
                    tokens.push(token.to_string());
                }
            }

            found.then(|| Value::Text(tokens.join(",")))
        }
        _ => None,
    }
}
