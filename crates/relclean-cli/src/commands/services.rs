//! Services command

use super::Session;
use crate::app::OutputFormat;
use anyhow::Result;
use relclean_core::Localizer;
use serde::Serialize;

#[derive(Serialize)]
struct ServiceRow {
    identifier: String,
    title: String,
    enabled: bool,
    scheduler_task: bool,
    toolbar: bool,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn run(session: &Session, format: OutputFormat) -> Result<()> {
    let rows: Vec<ServiceRow> = session
        .registry
        .identifiers()
        .filter_map(|id| session.registry.get(id).map(|r| (id, r.options)))
        .map(|(id, options)| ServiceRow {
            identifier: id.to_string(),
            title: session
                .catalog
                .translate(&format!("services.{}.title", id), &[])
                .unwrap_or_else(|| id.to_string()),
            enabled: options.enabled,
            scheduler_task: options.scheduler_task,
            toolbar: options.toolbar,
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Cli => {
            for row in &rows {
                println!("{:<20} {}", row.identifier, row.title);
                println!(
                    "  enabled: {}  scheduler: {}  toolbar: {}",
                    yes_no(row.enabled),
                    yes_no(row.scheduler_task),
                    yes_no(row.toolbar)
                );
            }
        }
    }
    Ok(())
}
