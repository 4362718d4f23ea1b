//! Run commands

use super::Session;
use crate::app::{OutputFormat, RunAllArgs, RunArgs};
use crate::output;
use anyhow::Result;
use relclean_core::{run_scheduled, run_service};

pub fn run(args: RunArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let dry_run = session.dry_run(args.commit);
    let report = run_service(
        &session.registry,
        &args.identifier,
        session.context(),
        dry_run,
        &session.db,
    )?;

    output::print_runs(&[(args.identifier, Ok(report))], dry_run, format)
}

pub fn run_all(args: RunAllArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let dry_run = session.dry_run(args.commit);
    let results = run_scheduled(&session.registry, session.context(), dry_run, &session.db);

    output::print_runs(&results, dry_run, format)?;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} services failed", failed, results.len());
    }
    Ok(())
}
