//! Cleanup service for references to missing records

use super::{ReferenceBucket, ReferenceFindings, ReferenceIndexScanner, ReferenceRepairer};
use crate::error::Result;
use crate::log::ExecutionLog;
use crate::service::{self, CleanupService, Journal, Outcome, ServiceContext};

const DELETED_RECORDS_NOTE: &str = "Keeping the references is useful if you undelete the referenced records later, \
     otherwise the references are lost completely when the deleted records are flushed at some point. \
     Notice that if those records listed are themselves deleted (marked with \"DELETED\") it is not a problem.";

/// Finds references and soft references pointing to
/// - records which are marked as deleted
/// - offline versions, which must never be referenced directly
/// - records which do not exist at all
///
/// and removes the managed references to missing records and offline versions.
pub struct MissingRelationsService<'a> {
    ctx: ServiceContext<'a>,
    journal: Journal<'a>,
}

impl<'a> MissingRelationsService<'a> {
    pub const IDENTIFIER: &'static str = "missingRelations";

    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            journal: Journal::new(Self::IDENTIFIER, ctx.user, ctx.localizer),
        }
    }

    /// Run the index scan only
    pub fn scan(&self) -> Result<ReferenceFindings> {
        ReferenceIndexScanner::new(self.ctx.store, self.ctx.schema).scan()
    }

    fn report(&mut self, bucket: &ReferenceBucket, headline: String) {
        if bucket.is_empty() {
            return;
        }
        self.journal.add_message(headline);

        for (target, entries) in bucket.groups() {
            let references: Vec<String> = entries
                .iter()
                .map(|e| format!("{} (Hash: {})", e.describe(), e.hash))
                .collect();
            self.journal.add_message(format!(
                "Target: {} -> References: {}",
                target,
                references.join(", ")
            ));
        }
    }

    fn report_manual_cases(&mut self, findings: &ReferenceFindings) {
        self.report(
            &findings.missing_soft,
            format!(
                "Found {} non-existing records that are still being soft-referenced in the following locations. \
                 These relations cannot be removed automatically and need manual repair.",
                findings.missing_soft.len()
            ),
        );
        self.report(
            &findings.offline_duplicates_soft,
            format!(
                "Found {} soft-references pointing to offline versions, which should never be referenced directly. \
                 These relations cannot be removed automatically and need manual repair.",
                findings.offline_duplicates_soft.len()
            ),
        );
        self.report(
            &findings.soft_deleted,
            format!(
                "Found {} references pointing to deleted records. {}",
                findings.soft_deleted.len(),
                DELETED_RECORDS_NOTE
            ),
        );
        self.report(
            &findings.soft_deleted_soft,
            format!(
                "Found {} soft references pointing to deleted records. {}",
                findings.soft_deleted_soft.len(),
                DELETED_RECORDS_NOTE
            ),
        );
    }
}

impl CleanupService for MissingRelationsService<'_> {
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
        let findings = self.scan()?;
        tracing::info!(
            flagged = findings.flagged(),
            actionable = findings.actionable(),
            dry_run = self.journal.dry_run(),
            "reference scan finished"
        );

        self.report_manual_cases(&findings);

        if findings.actionable() == 0 {
            let message = "Nothing to do, no missing relations found. Everything is in place.";
            self.journal.add_message(message);
            return Ok(service::info(self.ctx.localizer, message));
        }

        if self.journal.dry_run() {
            let message = format!(
                "Found {} references to non-existing records and {} references directly linked to offline versions.",
                findings.missing.len(),
                findings.offline_duplicates.len()
            );
            return Ok(service::info(self.ctx.localizer, message));
        }

        let stats = ReferenceRepairer::new(self.ctx.store).repair(
            &findings.missing,
            &findings.offline_duplicates,
            &mut self.journal,
        );
        if stats.failed > 0 {
            tracing::warn!(failed = stats.failed, "some references could not be removed, see execution log");
        }

        let message = "All references were updated accordingly.";
        self.journal.add_message(message);
        Ok(service::success(self.ctx.localizer, Some(message.to_string())))
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
    use crate::log::LogMessage;
    use crate::references::NewReference;
    use crate::schema::{Schema, TableSchema};
    use crate::service::Severity;

    fn setup() -> (Database, Schema) {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.execute_batch(
            "CREATE TABLE pages (uid INTEGER PRIMARY KEY, pid INTEGER, deleted INTEGER, t3ver_oid INTEGER, t3ver_wsid INTEGER);
             INSERT INTO pages VALUES (1, 0, 0, 0, 0), (2, 0, 1, 0, 0), (3, -1, 0, 1, 1);
             CREATE TABLE tt_content (uid INTEGER PRIMARY KEY, records TEXT, bodytext TEXT);
             INSERT INTO tt_content VALUES (1, '1,2,3,9', 'link to t3://page?uid=9');",
        )
        .unwrap();
        for uid in [1, 2, 3, 9] {
            db.add_reference(&NewReference::managed("tt_content", 1, "records", "pages", uid))
                .unwrap();
        }
        db.add_reference(
            &NewReference::managed("tt_content", 1, "bodytext", "pages", 9).soft("typolink"),
        )
        .unwrap();

        let schema = Schema::default()
            .with_table(TableSchema::new("pages").with_delete_column("deleted").versioned());
        (db, schema)
    }

    #[test]
    fn test_dry_run_reports_and_keeps_data() {
        let (db, schema) = setup();
        let catalog = Catalog::with_defaults();
        let mut service = MissingRelationsService::new(ServiceContext::new(&db, &schema, &catalog));

        let before = service.scan().unwrap();
        let outcome = service.execute().unwrap();
        let after = service.scan().unwrap();

        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(
            outcome.message,
            "Found 1 references to non-existing records and 1 references directly linked to offline versions."
        );
        assert_eq!(before, after);
        assert!(service.log().is_none());
        assert_eq!(db.reference_count().unwrap(), 5);
    }

    #[test]
    fn test_commit_removes_only_repairable_references() {
        let (db, schema) = setup();
        let catalog = Catalog::with_defaults();
        let mut service = MissingRelationsService::new(ServiceContext::new(&db, &schema, &catalog));
        service.set_dry_run(false);

        let outcome = service.execute().unwrap();
        assert_eq!(outcome.severity, Severity::Ok);
        assert_eq!(outcome.message, "All references were updated accordingly.");

        let row = db.fetch_record("tt_content", 1, &["records", "bodytext"]).unwrap().unwrap();
        assert_eq!(row.get("records"), Some(&crate::db::Value::Text("1,2".into())));

        let findings = service.scan().unwrap();
        assert_eq!(findings.actionable(), 0);
        assert_eq!(findings.soft_deleted.len(), 1);
        assert_eq!(findings.missing_soft.len(), 1);

        let log = service.take_log().unwrap();
        let texts: Vec<String> = log.render(&catalog);
        assert!(texts[0].starts_with("Found 1 non-existing records that are still being soft-referenced"));
        assert!(texts[1].starts_with("Target: pages:9 -> References: tt_content:1:bodytext:typolink"));
        assert!(texts[2].starts_with("Found 1 references pointing to deleted records."));
        assert!(texts[3].starts_with("Target: pages:2 -> References: tt_content:1:records (Hash: "));
        assert_eq!(
            log.messages.last(),
            Some(&LogMessage::Text("All references were updated accordingly.".into()))
        );
    }

    #[test]
    fn test_target_listed_twice_settles_in_one_run() {
        let (db, schema) = setup();
        db.execute_batch("UPDATE tt_content SET records = '1,9,9' WHERE uid = 1")
            .unwrap();
        db.add_reference(
            &NewReference::managed("tt_content", 1, "records", "pages", 9).with_sorting(1),
        )
        .unwrap();
        let catalog = Catalog::with_defaults();

        for _ in 0..2 {
            let mut service =
                MissingRelationsService::new(ServiceContext::new(&db, &schema, &catalog));
            service.set_dry_run(false);
            service.execute().unwrap();
            let log = service.take_log().unwrap();
            assert!(!log
                .render(&catalog)
                .iter()
                .any(|m| m.starts_with("Removing reference")));
        }

        let row = db.fetch_record("tt_content", 1, &["records"]).unwrap().unwrap();
        assert_eq!(row.get("records"), Some(&crate::db::Value::Text("1".into())));
        let findings = MissingRelationsService::new(ServiceContext::new(&db, &schema, &catalog))
            .scan()
            .unwrap();
        assert_eq!(findings.missing.len(), 0);
    }

    #[test]
    fn test_nothing_to_do() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let schema = Schema::default();
        let catalog = Catalog::with_defaults();
        let mut service = MissingRelationsService::new(ServiceContext::new(&db, &schema, &catalog));
        service.set_dry_run(false);

        let outcome = service.execute().unwrap();
        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(
            outcome.message,
            "Nothing to do, no missing relations found. Everything is in place."
        );
        assert_eq!(service.log().unwrap().len(), 1);
    }
}
