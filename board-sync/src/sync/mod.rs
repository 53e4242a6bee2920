//! Spreadsheet-to-board reconciliation
//!
//! A run fetches the board's items, indexes them by the identifying column,
//! then walks the spreadsheet rows in order and creates or updates one item
//! per row. Requests are sequential; the index is read-only once built.

pub mod dispatch;
pub mod fetch;
pub mod index;
pub mod processor;
pub mod report;
pub mod row;

pub use index::{DuplicatePolicy, ItemIndex};
pub use report::{SyncReport, export_report};

use anyhow::{Context, Result};

use dispatch::MutationDispatcher;
use fetch::fetch_existing_items;
use processor::RowProcessor;
use row::SpreadsheetRow;

use crate::api::GraphqlTransport;
use crate::config::SyncConfig;

/// Fetch and index the board's existing items
pub async fn build_index(
    transport: &dyn GraphqlTransport,
    config: &SyncConfig,
) -> Result<ItemIndex> {
    let fetched = fetch_existing_items(transport, &config.board).await?;
    ItemIndex::build(
        &fetched,
        &config.board.columns.identifying,
        config.options.duplicates,
    )
    .context("Failed to index existing board items")
}

/// Run a full sync of `rows` into the configured board.
///
/// Fetch and index failures abort the run. Row failures are recorded in the
/// returned report and never stop the remaining rows.
pub async fn run_sync(
    transport: &dyn GraphqlTransport,
    config: &SyncConfig,
    rows: &[SpreadsheetRow],
) -> Result<SyncReport> {
    let index = build_index(transport, config).await?;
    if index.is_empty() {
        log::info!("No existing keys on board {}, every row will be created", config.board.board_id);
    }

    let dispatcher = MutationDispatcher::new(transport, &config.board.board_id);
    let processor = RowProcessor::new(
        dispatcher,
        &index,
        &config.board.columns,
        &config.options,
    );

    let mut report = SyncReport::new(&config.board.board_id, config.options.dry_run, index.len());
    for outcome in processor.process(rows).await {
        report.push(outcome);
    }

    let summary = report.summary();
    log::info!(
        "Sync finished: {} rows, {} created, {} updated, {} failed, {} planned, {} skipped",
        summary.rows,
        summary.created,
        summary.updated,
        summary.failed,
        summary.planned,
        summary.skipped
    );

    Ok(report)
}
