//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relclean")]
#[command(
    author,
    version,
    about = "Detect and repair corrupt relations and dangling references"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Schema metadata file (overrides the config)
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered cleanup services
    Services,

    /// Run a single cleanup service
    Run(RunArgs),

    /// Run every service enabled for scheduled runs
    RunAll(RunAllArgs),

    /// Show the M:N relations declared in the schema
    Relations,

    /// Show stored execution logs
    History(HistoryArgs),

    /// Delete old execution logs
    PruneHistory(PruneArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Service identifier
    pub identifier: String,

    /// Apply repairs instead of a dry run
    #[arg(long)]
    pub commit: bool,
}

#[derive(Args)]
pub struct RunAllArgs {
    /// Apply repairs instead of a dry run
    #[arg(long)]
    pub commit: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of logs to list
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Show the messages of one log
    #[arg(long)]
    pub id: Option<i64>,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Remove logs older than this many days (default from config)
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
}
