//! Cleanup service for corrupt M:N relations

use super::{CorruptFindingSet, CorruptRelationDetector, CorruptRelationRepairer, RelationSchemaIndexer};
use crate::error::Result;
use crate::log::ExecutionLog;
use crate::service::{self, CleanupService, Journal, Outcome, ServiceContext};

const NO_RELATIONS_KEY: &str = "corrupt_relations.no_relations";
const DRY_RUN_KEY: &str = "corrupt_relations.dry_run";
const NOTHING_TO_DO_KEY: &str = "corrupt_relations.nothing_to_do";

/// Detects and removes join rows that are duplicated or point to records
/// which do not exist
pub struct CorruptRelationsService<'a> {
    ctx: ServiceContext<'a>,
    journal: Journal<'a>,
}

impl<'a> CorruptRelationsService<'a> {
    pub const IDENTIFIER: &'static str = "corruptRelations";

    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            journal: Journal::new(Self::IDENTIFIER, ctx.user, ctx.localizer),
        }
    }

    /// Run detection only; `None` when the schema declares no relations
    pub fn scan(&self) -> Result<Option<CorruptFindingSet>> {
        match RelationSchemaIndexer::new(self.ctx.schema).discover() {
            Some(definitions) => CorruptRelationDetector::new(self.ctx.store)
                .detect(&definitions)
                .map(Some),
            None => Ok(None),
        }
    }
}

impl CleanupService for CorruptRelationsService<'_> {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn dry_run(&self) -> bool {
        self.journal.dry_run()
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.journal.set_dry_run(dry_run);
    }

    fn execute(&mut self) -> Result<Outcome> {
        let Some(findings) = self.scan()? else {
            let message = self.journal.add_localized(NO_RELATIONS_KEY, &[]);
            return Ok(service::info(self.ctx.localizer, message));
        };

        tracing::info!(
            tables = findings.affected_tables,
            rows = findings.affected_rows,
            dry_run = self.journal.dry_run(),
            "corrupt relation scan finished"
        );

        if findings.is_empty() {
            let message = self.journal.add_localized(NOTHING_TO_DO_KEY, &[]);
            return Ok(service::info(self.ctx.localizer, message));
        }

        if self.journal.dry_run() {
            let message = self.journal.add_localized(
                DRY_RUN_KEY,
                &[
                    findings.affected_rows.to_string(),
                    findings.affected_tables.to_string(),
                ],
            );
            return Ok(service::info(self.ctx.localizer, message));
        }

        CorruptRelationRepairer::new(self.ctx.store).repair(&findings, &mut self.journal)
    }

    fn log(&self) -> Option<&ExecutionLog> {
        self.journal.log()
    }

    fn take_log(&mut self) -> Option<ExecutionLog> {
        self.journal.take_log()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::localization::Catalog;
    use crate::schema::{ColumnSchema, Schema, TableSchema};
    use crate::service::Severity;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.execute_batch(
            "CREATE TABLE pages (uid INTEGER PRIMARY KEY);
             CREATE TABLE sys_category (uid INTEGER PRIMARY KEY);
             INSERT INTO pages (uid) VALUES (1), (2);
             INSERT INTO sys_category (uid) VALUES (1);
             CREATE TABLE sys_category_record_mm (uid_local INTEGER, uid_foreign INTEGER, tablenames TEXT);
             INSERT INTO sys_category_record_mm VALUES (1, 1, 'pages'), (1, 1, 'pages'), (2, 5, 'pages');",
        )
        .unwrap();
        db
    }

    fn schema() -> Schema {
        Schema::default().with_table(TableSchema::new("pages").with_column(
            ColumnSchema::many_to_many("categories", "sys_category_record_mm", "sys_category"),
        ))
    }

    #[test]
    fn test_dry_run_reports_counts_without_writes() {
        let db = setup();
        let schema = schema();
        let catalog = Catalog::with_defaults();
        let mut service = CorruptRelationsService::new(ServiceContext::new(&db, &schema, &catalog));
        assert!(service.dry_run());

        let outcome = service.execute().unwrap();
        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(outcome.message, "Found 3 corrupt relation entries in 1 tables.");
        assert!(service.log().is_none());
        assert_eq!(db.fetch_all("sys_category_record_mm").unwrap().len(), 3);
    }

    #[test]
    fn test_commit_repairs_and_logs() {
        let db = setup();
        let schema = schema();
        let catalog = Catalog::with_defaults();
        let ctx = ServiceContext::new(&db, &schema, &catalog).with_user(Some(2));
        let mut service = CorruptRelationsService::new(ctx);
        service.set_dry_run(false);

        let outcome = service.execute().unwrap();
        assert_eq!(outcome.severity, Severity::Ok);
        assert!(db.fetch_all("sys_category_record_mm").unwrap().is_empty());

        let log = service.take_log().unwrap();
        assert_eq!(log.created_by, Some(2));
        assert_eq!(log.len(), 1);

        // Second run has nothing left to do
        let outcome = service.execute().unwrap();
        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(outcome.message, "Nothing to do, no corrupt M:N relations found.");
    }

    #[test]
    fn test_commit_keeps_join_table_without_key_columns() {
        let db = setup();
        db.execute_batch(
            "CREATE TABLE legacy_mm (page INTEGER, category INTEGER);
             INSERT INTO legacy_mm VALUES (1, 1), (2, 1);",
        )
        .unwrap();
        let schema = Schema::default().with_table(TableSchema::new("pages").with_column(
            ColumnSchema::many_to_many("legacy", "legacy_mm", "sys_category"),
        ));
        let catalog = Catalog::with_defaults();
        let mut service = CorruptRelationsService::new(ServiceContext::new(&db, &schema, &catalog));
        service.set_dry_run(false);

        assert!(service.execute().is_err());
        assert_eq!(db.fetch_all("legacy_mm").unwrap().len(), 2);
        assert!(service.log().is_none());
    }

    #[test]
    fn test_schema_without_relations() {
        let db = setup();
        let schema = Schema::default().with_table(TableSchema::new("pages"));
        let catalog = Catalog::with_defaults();
        let mut service = CorruptRelationsService::new(ServiceContext::new(&db, &schema, &catalog));
        service.set_dry_run(false);

        let outcome = service.execute().unwrap();
        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(outcome.message, "No M:N relations are defined in the schema.");
        assert_eq!(service.log().unwrap().len(), 1);
    }
}
