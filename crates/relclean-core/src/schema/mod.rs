//! Schema metadata
//!
//! Describes the tables of the managed database the way the cleanup services
//! need to see them:
//! - ordered column configurations (M:N declarations)
//! - the soft-delete flag column of a table
//! - whether a table carries version-tracking columns

use crate::error::{CleanupError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column holding the uid of the live record a version row was copied from
pub const VERSION_ORIGIN_COLUMN: &str = "t3ver_oid";

/// Column holding the workspace id of a version row
pub const VERSION_WORKSPACE_COLUMN: &str = "t3ver_wsid";

/// Read access to schema metadata
pub trait SchemaProvider {
    /// All tables, in declaration order
    fn tables(&self) -> &[TableSchema];

    /// Look up a single table by name
    fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables().iter().find(|t| t.name == name)
    }
}

/// Schema metadata for a whole database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

/// Metadata of a single table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,

    /// Column flagging a row as soft-deleted
    #[serde(default)]
    pub delete_column: Option<String>,

    /// Table carries `t3ver_oid` / `t3ver_wsid`
    #[serde(default)]
    pub versioned: bool,

    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

/// A column and its relation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,

    /// M:N join table backing this column
    #[serde(default)]
    pub join_table: Option<String>,

    /// Table on the other end of the relation
    #[serde(default)]
    pub foreign_table: Option<String>,

    /// Set when this column is the opposite (foreign) side of a relation
    /// declared elsewhere
    #[serde(default)]
    pub opposite_field: Option<String>,
}

impl SchemaProvider for Schema {
    fn tables(&self) -> &[TableSchema] {
        &self.tables
    }
}

impl Schema {
    /// Load schema metadata from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let schema = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), tables = schema.tables.len(), "schema loaded");
        Ok(schema)
    }

    /// Parse schema metadata from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let schema: Schema = serde_yaml::from_str(content)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Add a table
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    fn validate(&self) -> Result<()> {
        for (i, table) in self.tables.iter().enumerate() {
            if table.name.trim().is_empty() {
                return Err(CleanupError::Schema(format!("table #{} has no name", i)));
            }
            if self.tables[..i].iter().any(|t| t.name == table.name) {
                return Err(CleanupError::Schema(format!(
                    "table '{}' is declared twice",
                    table.name
                )));
            }
        }
        Ok(())
    }
}

impl TableSchema {
    /// Create table metadata without columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delete_column: None,
            versioned: false,
            columns: Vec::new(),
        }
    }

    /// Set the soft-delete column
    pub fn with_delete_column(mut self, column: impl Into<String>) -> Self {
        self.delete_column = Some(column.into());
        self
    }

    /// Mark table as version-aware
    pub fn versioned(mut self) -> Self {
        self.versioned = true;
        self
    }

    /// Append a column
    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }
}

impl ColumnSchema {
    /// Plain column without relation configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Local side of an M:N relation
    pub fn many_to_many(
        name: impl Into<String>,
        join_table: impl Into<String>,
        foreign_table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            join_table: Some(join_table.into()),
            foreign_table: Some(foreign_table.into()),
            opposite_field: None,
        }
    }

    /// Mark this column as the opposite side of a relation
    pub fn opposite_of(mut self, field: impl Into<String>) -> Self {
        self.opposite_field = Some(field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA_YAML: &str = r#"
tables:
  - name: pages
    delete_column: deleted
    versioned: true
    columns:
      - name: title
      - name: categories
        join_table: sys_category_record_mm
        foreign_table: sys_category
  - name: sys_category
    delete_column: deleted
    columns:
      - name: items
        join_table: sys_category_record_mm
        foreign_table: pages
        opposite_field: categories
"#;

    #[test]
    fn test_schema_from_yaml() {
        let schema = Schema::from_yaml(SCHEMA_YAML).unwrap();
        assert_eq!(schema.tables().len(), 2);

        let pages = schema.table("pages").unwrap();
        assert_eq!(pages.delete_column.as_deref(), Some("deleted"));
        assert!(pages.versioned);
        assert_eq!(pages.columns[0].name, "title");
        assert!(pages.columns[0].join_table.is_none());
        assert_eq!(
            pages.columns[1].join_table.as_deref(),
            Some("sys_category_record_mm")
        );

        let category = schema.table("sys_category").unwrap();
        assert!(!category.versioned);
        assert_eq!(
            category.columns[0].opposite_field.as_deref(),
            Some("categories")
        );
        assert!(schema.table("tt_content").is_none());
    }

    #[test]
    fn test_schema_rejects_duplicate_table() {
        let yaml = "tables:\n  - name: pages\n  - name: pages\n";
        let err = Schema::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CleanupError::Schema(_)));
    }

    #[test]
    fn test_schema_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yml");
        std::fs::write(&path, SCHEMA_YAML).unwrap();

        let schema = Schema::load(&path).unwrap();
        assert_eq!(schema.tables().len(), 2);
    }
}
