//! Relations command

use super::Session;
use crate::app::OutputFormat;
use anyhow::Result;
use relclean_core::{Localizer, RelationDefinition, RelationSchemaIndexer};

pub fn run(session: &Session, format: OutputFormat) -> Result<()> {
    let definitions: Vec<RelationDefinition> = RelationSchemaIndexer::new(&session.schema)
        .discover()
        .map(|found| found.into_values().collect())
        .unwrap_or_default();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }
        OutputFormat::Cli => {
            if definitions.is_empty() {
                let message = session
                    .catalog
                    .translate("corrupt_relations.no_relations", &[])
                    .unwrap_or_else(|| "No M:N relations defined".to_string());
                println!("{}", message);
            }
            for definition in &definitions {
                println!(
                    "{}: {} -> {}",
                    definition.join_table, definition.local_table, definition.foreign_table
                );
            }
        }
    }
    Ok(())
}
