//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use anyhow::Result;
use relclean_core::RunReport;

/// Result of running one service, as printed
pub type RunResult = (String, relclean_core::Result<RunReport>);

/// Print run results in the requested format
pub fn print_runs(results: &[RunResult], dry_run: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print!("{}", json::format_runs(results, dry_run));
            Ok(())
        }
        OutputFormat::Cli => terminal::write_runs(results, dry_run),
    }
}
