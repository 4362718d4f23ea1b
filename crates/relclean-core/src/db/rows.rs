//! Generic row access for managed tables

use super::Database;
use crate::error::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Primary key column of managed tables
pub const UID_COLUMN: &str = "uid";

/// An ordered `column -> value` mapping read from a table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Value of a column, if the row has it
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Integer value of a column; text holding a number is accepted
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(i) => Some(*i),
            Value::Real(f) => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Columns in read order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, &value_to_json(value))?;
        }
        map.end()
    }
}

/// Render a store value as JSON
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Blob(b) => serde_json::Value::from(format!("<{} bytes>", b.len())),
    }
}

/// Render a store value as plain text
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Quote an SQL identifier
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Database {
    /// Load every row of a table; a missing table has no rows
    pub fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        if !self.table_exists(table)? {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_identifier(table)))?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let rows = stmt
            .query_map([], |row| {
                let mut result = Row::new();
                for (i, name) in names.iter().enumerate() {
                    result.push(name.clone(), row.get::<_, Value>(i)?);
                }
                Ok(result)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Check if a row with the given uid exists; a missing table has no rows
    pub fn record_exists(&self, table: &str, uid: &Value) -> Result<bool> {
        if !self.table_exists(table)? {
            return Ok(false);
        }
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                quote_identifier(table),
                quote_identifier(UID_COLUMN)
            ),
            params![uid],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete every row equal to `row` on all of its columns
    pub fn delete_matching(&self, table: &str, row: &Row) -> Result<usize> {
        if row.is_empty() {
            return Ok(0);
        }

        let predicates: Vec<String> = row
            .columns()
            .enumerate()
            .map(|(i, (name, _))| format!("{} IS ?{}", quote_identifier(name), i + 1))
            .collect();
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            quote_identifier(table),
            predicates.join(" AND ")
        );

        let deleted = self
            .conn
            .execute(&sql, params_from_iter(row.columns().map(|(_, value)| value)))?;
        Ok(deleted)
    }

    /// Fetch selected columns of a single row by uid.
    ///
    /// Requested columns the table does not have are left out of the row.
    pub fn fetch_record(&self, table: &str, uid: i64, columns: &[&str]) -> Result<Option<Row>> {
        let available = self.table_columns(table)?;
        if available.is_empty() {
            return Ok(None);
        }
        let columns: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| available.iter().any(|a| a == c))
            .collect();
        if columns.is_empty() {
            return Ok(None);
        }

        let select: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
            select.join(", "),
            quote_identifier(table),
            quote_identifier(UID_COLUMN)
        );

        let result = self.conn.query_row(&sql, params![uid], |row| {
            let mut record = Row::new();
            for (i, name) in columns.iter().enumerate() {
                record.push(*name, row.get::<_, Value>(i)?);
            }
            Ok(record)
        });

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.execute_batch(
            "CREATE TABLE pages (uid INTEGER PRIMARY KEY, pid INTEGER, deleted INTEGER);
             INSERT INTO pages VALUES (1, 0, 0), (2, 1, 1);
             CREATE TABLE pages_mm (uid_local INTEGER, uid_foreign INTEGER, tablenames TEXT, sorting INTEGER);
             INSERT INTO pages_mm VALUES (1, 2, 'pages', 1), (1, 2, 'pages', 1), (1, 2, NULL, 3);",
        )
        .unwrap();
        db
    }

    #[test]
    fn test_fetch_all_keeps_column_order() {
        let db = setup();
        let rows = db.fetch_all("pages_mm").unwrap();
        assert_eq!(rows.len(), 3);
        let names: Vec<&str> = rows[0].columns().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["uid_local", "uid_foreign", "tablenames", "sorting"]);
        assert_eq!(rows[0].get_i64("uid_foreign"), Some(2));
        assert_eq!(rows[2].get("tablenames"), Some(&Value::Null));
    }

    #[test]
    fn test_record_exists() {
        let db = setup();
        assert!(db.record_exists("pages", &Value::Integer(1)).unwrap());
        assert!(!db.record_exists("pages", &Value::Integer(9)).unwrap());
        assert!(!db.record_exists("missing_table", &Value::Integer(1)).unwrap());
    }

    #[test]
    fn test_delete_matching_uses_every_column() {
        let db = setup();
        let rows = db.fetch_all("pages_mm").unwrap();

        // Both identical rows go, the NULL row only matches itself
        assert_eq!(db.delete_matching("pages_mm", &rows[0]).unwrap(), 2);
        assert_eq!(db.delete_matching("pages_mm", &rows[2]).unwrap(), 1);
        assert!(db.fetch_all("pages_mm").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_record() {
        let db = setup();
        let record = db
            .fetch_record("pages", 2, &["uid", "pid", "deleted"])
            .unwrap()
            .unwrap();
        assert_eq!(record.get_i64("deleted"), Some(1));
        assert!(db.fetch_record("pages", 5, &["uid"]).unwrap().is_none());
        assert!(db.fetch_record("nope", 1, &["uid"]).unwrap().is_none());

        let partial = db
            .fetch_record("pages", 1, &["uid", "pid", "t3ver_oid"])
            .unwrap()
            .unwrap();
        assert_eq!(partial.len(), 2);
        assert!(partial.get("t3ver_oid").is_none());
    }

    #[test]
    fn test_row_serializes_as_object() {
        let row = Row::new().with("uid_local", 1i64).with("tablenames", "pages".to_string());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"uid_local": 1, "tablenames": "pages"}));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("pages"), "\"pages\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
