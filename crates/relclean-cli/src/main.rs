//! relclean CLI
//!
//! Finds and repairs broken relations in a content database.

use anyhow::Result;
use clap::Parser;
use relclean_core::error::exit_codes;
use relclean_core::{Catalog, CleanupError, Config, Database, Schema, ServiceRegistry};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};
use commands::Session;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<CleanupError>()
            .map(CleanupError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    // Open database (RELCLEAN_DB, then config, then default)
    let db_path = config.database_path();
    let db = Database::open(&db_path)?;
    db.initialize()?;

    let schema = match cli.schema.as_ref().or(config.schema.as_ref()) {
        Some(path) => Schema::load(path)?,
        None => Schema::default(),
    };
    let catalog = Catalog::from_paths(&config.localization_paths)?;

    let mut registry = ServiceRegistry::with_defaults();
    config.apply_to(&mut registry)?;

    let session = Session {
        config,
        db,
        schema,
        catalog,
        registry,
    };

    match cli.command {
        Commands::Services => commands::services::run(&session, cli.format),
        Commands::Run(args) => commands::run::run(args, &session, cli.format),
        Commands::RunAll(args) => commands::run::run_all(args, &session, cli.format),
        Commands::Relations => commands::relations::run(&session, cli.format),
        Commands::History(args) => commands::history::run(args, &session, cli.format),
        Commands::PruneHistory(args) => commands::history::prune(args, &session),
    }
}
