//! History commands

use super::Session;
use crate::app::{HistoryArgs, OutputFormat, PruneArgs};
use anyhow::Result;

pub fn run(args: HistoryArgs, session: &Session, format: OutputFormat) -> Result<()> {
    match args.id {
        Some(id) => show(id, session, format),
        None => list(args.limit, session, format),
    }
}

fn list(limit: usize, session: &Session, format: OutputFormat) -> Result<()> {
    let logs = session.db.list_logs(limit)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        OutputFormat::Cli => {
            if logs.is_empty() {
                println!("No execution logs");
            }
            for log in &logs {
                let user = log
                    .created_by
                    .map(|u| format!(" by user {}", u))
                    .unwrap_or_default();
                println!(
                    "#{:<5} {:<20} {}{} ({} messages)",
                    log.id, log.service, log.created_at, user, log.message_count
                );
            }
        }
    }
    Ok(())
}

fn show(id: i64, session: &Session, format: OutputFormat) -> Result<()> {
    let Some(log) = session.db.load_log(id)? else {
        anyhow::bail!("Execution log #{} not found", id);
    };
    let messages = log.render(&session.catalog);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": id,
                "service": log.service,
                "created_at": log.created_at.to_rfc3339(),
                "created_by": log.created_by,
                "messages": messages,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            println!(
                "Execution log #{} of {} at {}",
                id,
                log.service,
                log.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            for message in &messages {
                println!("  {}", message);
            }
        }
    }
    Ok(())
}

pub fn prune(args: PruneArgs, session: &Session) -> Result<()> {
    let days = args.days.unwrap_or(session.config.history.retention_days);
    let removed = session.db.prune_logs(days)?;
    println!("Removed {} execution logs older than {} days", removed, days);
    Ok(())
}
