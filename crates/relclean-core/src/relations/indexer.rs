//! Discovery of M:N relations from schema metadata

use super::RelationDefinition;
use crate::schema::SchemaProvider;
use std::collections::BTreeMap;

/// Finds every join table declared in the schema
pub struct RelationSchemaIndexer<'a> {
    schema: &'a dyn SchemaProvider,
}

impl<'a> RelationSchemaIndexer<'a> {
    pub fn new(schema: &'a dyn SchemaProvider) -> Self {
        Self { schema }
    }

    /// One definition per distinct join table, or `None` if there is none.
    ///
    /// Columns carrying an opposite-field marker describe the foreign side of
    /// a relation declared elsewhere and are skipped, so reciprocal
    /// declarations never produce a second definition.
    pub fn discover(&self) -> Option<BTreeMap<String, RelationDefinition>> {
        let mut relations = BTreeMap::new();

        for table in self.schema.tables() {
            for column in &table.columns {
                if column.opposite_field.is_some() {
                    continue;
                }
                let (Some(join_table), Some(foreign_table)) =
                    (&column.join_table, &column.foreign_table)
                else {
                    continue;
                };
                if join_table.is_empty() || foreign_table.is_empty() {
                    continue;
                }

                tracing::trace!(
                    table = %table.name,
                    column = %column.name,
                    join_table = %join_table,
                    "M:N declaration found"
                );
                relations.insert(
                    join_table.clone(),
                    RelationDefinition {
                        join_table: join_table.clone(),
                        local_table: table.name.clone(),
                        foreign_table: foreign_table.clone(),
                    },
                );
            }
        }

        (!relations.is_empty()).then_some(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, Schema, TableSchema};

    #[test]
    fn test_one_definition_per_join_table() {
        let schema = Schema::default()
            .with_table(
                TableSchema::new("pages")
                    .with_column(ColumnSchema::new("title"))
                    .with_column(ColumnSchema::many_to_many(
                        "categories",
                        "sys_category_record_mm",
                        "sys_category",
                    )),
            )
            .with_table(
                TableSchema::new("tt_content").with_column(ColumnSchema::many_to_many(
                    "categories",
                    "sys_category_record_mm",
                    "sys_category",
                )),
            )
            .with_table(
                TableSchema::new("sys_category").with_column(
                    ColumnSchema::many_to_many("items", "sys_category_record_mm", "pages")
                        .opposite_of("categories"),
                ),
            );

        let relations = RelationSchemaIndexer::new(&schema).discover().unwrap();
        assert_eq!(relations.len(), 1);

        let relation = &relations["sys_category_record_mm"];
        assert_eq!(relation.foreign_table, "sys_category");
        // Later local-side declarations replace earlier ones
        assert_eq!(relation.local_table, "tt_content");
    }

    #[test]
    fn test_requires_join_and_foreign_table() {
        let schema = Schema::default().with_table(
            TableSchema::new("pages")
                .with_column(ColumnSchema {
                    name: "only_join".into(),
                    join_table: Some("pages_mm".into()),
                    ..Default::default()
                })
                .with_column(ColumnSchema {
                    name: "only_foreign".into(),
                    foreign_table: Some("tt_content".into()),
                    ..Default::default()
                }),
        );

        assert!(RelationSchemaIndexer::new(&schema).discover().is_none());
    }

    #[test]
    fn test_empty_schema_has_no_relations() {
        let schema = Schema::default();
        assert!(RelationSchemaIndexer::new(&schema).discover().is_none());
    }

    #[test]
    fn test_distinct_join_tables() {
        let schema = Schema::default().with_table(
            TableSchema::new("pages")
                .with_column(ColumnSchema::many_to_many("a", "pages_a_mm", "tt_content"))
                .with_column(ColumnSchema::many_to_many("b", "pages_b_mm", "sys_file")),
        );

        let relations = RelationSchemaIndexer::new(&schema).discover().unwrap();
        let keys: Vec<&str> = relations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["pages_a_mm", "pages_b_mm"]);
    }
}
