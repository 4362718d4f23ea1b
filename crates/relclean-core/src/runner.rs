//! Running registered services and persisting their logs

use crate::db::Database;
use crate::error::Result;
use crate::registry::ServiceRegistry;
use crate::service::{Outcome, ServiceContext};
use serde::Serialize;

/// Result of one service run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub identifier: String,
    pub outcome: Outcome,
    /// Id of the stored execution log, if the run produced one
    pub log_id: Option<i64>,
}

/// Create, execute and persist a single service
pub fn run_service(
    registry: &ServiceRegistry,
    identifier: &str,
    ctx: ServiceContext<'_>,
    dry_run: bool,
    db: &Database,
) -> Result<RunReport> {
    let mut service = registry.create(identifier, ctx)?;
    service.set_dry_run(dry_run);

    tracing::info!(identifier, dry_run, "running cleanup service");
    let outcome = service.execute()?;

    let log_id = match service.take_log() {
        Some(log) if !log.is_empty() => Some(db.save_log(&log)?),
        _ => None,
    };

    tracing::info!(identifier, severity = %outcome.severity, ?log_id, "cleanup service finished");
    Ok(RunReport {
        identifier: identifier.to_string(),
        outcome,
        log_id,
    })
}

/// Run every enabled service flagged for scheduled use.
///
/// A failing service does not stop the remaining ones; its error is
/// returned in place of a report.
pub fn run_scheduled(
    registry: &ServiceRegistry,
    ctx: ServiceContext<'_>,
    dry_run: bool,
    db: &Database,
) -> Vec<(String, Result<RunReport>)> {
    registry
        .scheduler_services()
        .into_iter()
        .map(|identifier| {
            let result = run_service(registry, identifier, ctx, dry_run, db);
            if let Err(e) = &result {
                tracing::warn!(identifier, error = %e, "scheduled cleanup service failed");
            }
            (identifier.to_string(), result)
        })
        .collect()
}
