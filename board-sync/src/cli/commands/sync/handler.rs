//! Sync command handler

use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::*;

use super::SyncCommands;
use crate::api::BoardClient;
use crate::config::{ConfigOverrides, load_config_file};
use crate::sheet::read_rows;
use crate::sync::{SyncReport, export_report, run_sync};

/// Exit code when the run completed but at least one row failed
const ROW_FAILURE_EXIT: u8 = 2;

pub async fn handle_sync_command(args: SyncCommands, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config_file(config_path)?
        .resolve(&ConfigOverrides::from_env(), &args.overrides())
        .context("Invalid configuration")?;

    let rows = read_rows(&args.spreadsheet, config.options.sheet_name.as_deref())?;
    println!(
        "Read {} rows from {}",
        rows.len().to_string().bold(),
        args.spreadsheet.display().to_string().cyan()
    );
    if config.options.dry_run {
        println!("{}", "Dry run: no mutations will be sent".yellow());
    }

    let client = BoardClient::new(&config.api)?;
    log::debug!("Syncing into board {} via {}", config.board.board_id, client.endpoint());

    let start = Instant::now();
    let report = run_sync(&client, &config, &rows).await?;
    print_summary(&report, start.elapsed().as_secs_f64());

    if let Some(path) = &args.report {
        export_report(&report, path)?;
        println!("Report written to {}", path.display().to_string().cyan());
    }

    if report.has_failures() {
        Ok(ExitCode::from(ROW_FAILURE_EXIT))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_summary(report: &SyncReport, elapsed_secs: f64) {
    let summary = report.summary();

    println!();
    println!(
        "Board {} ({} items indexed)",
        report.board_id.bright_green().bold(),
        report.indexed_items
    );
    println!("  Rows:    {}", summary.rows);
    println!("  Created: {}", summary.created.to_string().green());
    println!("  Updated: {}", summary.updated.to_string().green());
    if summary.planned > 0 {
        println!("  Planned: {}", summary.planned.to_string().yellow());
    }
    if summary.skipped > 0 {
        println!("  Skipped: {}", summary.skipped.to_string().dimmed());
    }
    if summary.failed > 0 {
        println!("  Failed:  {}", summary.failed.to_string().red().bold());
    } else {
        println!("  Failed:  0");
    }
    println!("  Time:    {:.1}s", elapsed_secs);

    if report.has_failures() {
        println!();
        println!("{}", "Failed rows:".red().bold());
        for outcome in report.failures() {
            println!(
                "  row {} [{}]: {}",
                outcome.row_number,
                if outcome.key.is_empty() { "-" } else { &outcome.key },
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
