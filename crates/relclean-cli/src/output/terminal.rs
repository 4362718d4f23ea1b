//! Terminal output formatter

use super::RunResult;
use anyhow::Result;
use relclean_core::Severity;
use std::io::{IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Ok => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

/// Stdout, colored only when attached to a terminal
pub fn stdout() -> StandardStream {
    let choice = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn write_tag(out: &mut StandardStream, tag: &str, color: Color) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "[{}]", tag)?;
    out.reset()?;
    Ok(())
}

pub fn write_runs(results: &[RunResult], dry_run: bool) -> Result<()> {
    let mut out = stdout();

    if dry_run {
        writeln!(out, "Dry run, nothing was changed. Use --commit to apply repairs.")?;
    }

    for (identifier, result) in results {
        match result {
            Ok(report) => {
                let severity = report.outcome.severity;
                write_tag(&mut out, &severity.to_string(), severity_color(severity))?;
                writeln!(out, " {}: {}", report.identifier, report.outcome.headline)?;
                writeln!(out, "  {}", report.outcome.message)?;
                if let Some(log_id) = report.log_id {
                    writeln!(out, "  Execution log #{}", log_id)?;
                }
            }
            Err(e) => {
                write_tag(&mut out, "failed", Color::Red)?;
                writeln!(out, " {}", identifier)?;
                writeln!(out, "  {}", e)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
