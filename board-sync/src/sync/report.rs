//! Per-row outcomes and the batch report built from them
//!
//! Reports can be exported as:
//! - `.xlsx` with a summary sheet and a rows sheet
//! - `.json`
//! - CSV for anything else

use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use rust_xlsxwriter::{Color, Format, Workbook};
use serde::Serialize;

/// What was (or would be) sent for a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowAction {
    Create { item_name: String },
    Update { item_id: String },
}

impl RowAction {
    pub fn kind(&self) -> &'static str {
        match self {
            RowAction::Create { .. } => "create",
            RowAction::Update { .. } => "update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Succeeded,
    Failed,
    /// Dry run: decided but not sent
    Planned,
    /// Blank row left out
    Skipped,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Succeeded => write!(f, "succeeded"),
            RowStatus::Failed => write!(f, "failed"),
            RowStatus::Planned => write!(f, "planned"),
            RowStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of processing one spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// 1-based sheet row number
    pub row_number: usize,
    /// Normalized lookup key
    pub key: String,
    pub action: Option<RowAction>,
    pub status: RowStatus,
    /// Item id returned by the API
    pub item_id: Option<String>,
    /// HTTP status code from the response
    pub http_status: Option<u16>,
    /// Error message if the row failed
    pub error: Option<String>,
}

impl RowOutcome {
    pub fn succeeded(
        row_number: usize,
        key: String,
        action: RowAction,
        item_id: Option<String>,
        http_status: u16,
    ) -> Self {
        Self {
            row_number,
            key,
            action: Some(action),
            status: RowStatus::Succeeded,
            item_id,
            http_status: Some(http_status),
            error: None,
        }
    }

    pub fn failed(
        row_number: usize,
        key: String,
        action: RowAction,
        http_status: Option<u16>,
        error: String,
    ) -> Self {
        Self {
            row_number,
            key,
            action: Some(action),
            status: RowStatus::Failed,
            item_id: None,
            http_status,
            error: Some(error),
        }
    }

    pub fn planned(row_number: usize, key: String, action: RowAction) -> Self {
        Self {
            row_number,
            key,
            action: Some(action),
            status: RowStatus::Planned,
            item_id: None,
            http_status: None,
            error: None,
        }
    }

    pub fn skipped(row_number: usize) -> Self {
        Self {
            row_number,
            key: String::new(),
            action: None,
            status: RowStatus::Skipped,
            item_id: None,
            http_status: None,
            error: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == RowStatus::Failed
    }

    fn action_kind(&self) -> &'static str {
        self.action.as_ref().map(RowAction::kind).unwrap_or("")
    }

    fn target(&self) -> String {
        match &self.action {
            Some(RowAction::Create { item_name }) => item_name.clone(),
            Some(RowAction::Update { item_id }) => item_id.clone(),
            None => String::new(),
        }
    }
}

/// Counters over all outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub planned: usize,
    pub skipped: usize,
}

/// Everything a sync run did, returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub sync_date: String,
    pub board_id: String,
    pub dry_run: bool,
    /// Items present in the index before the run
    pub indexed_items: usize,
    pub outcomes: Vec<RowOutcome>,
}

impl SyncReport {
    pub fn new(board_id: impl Into<String>, dry_run: bool, indexed_items: usize) -> Self {
        Self {
            sync_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            board_id: board_id.into(),
            dry_run,
            indexed_items,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn summary(&self) -> SyncSummary {
        let mut summary = SyncSummary {
            rows: self.outcomes.len(),
            ..SyncSummary::default()
        };

        for outcome in &self.outcomes {
            match (outcome.status, &outcome.action) {
                (RowStatus::Succeeded, Some(RowAction::Create { .. })) => summary.created += 1,
                (RowStatus::Succeeded, Some(RowAction::Update { .. })) => summary.updated += 1,
                (RowStatus::Succeeded, None) => {}
                (RowStatus::Failed, _) => summary.failed += 1,
                (RowStatus::Planned, _) => summary.planned += 1,
                (RowStatus::Skipped, _) => summary.skipped += 1,
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(RowOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Write the report, choosing the format from the file extension
pub fn export_report(report: &SyncReport, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("xlsx") => export_report_to_excel(report, path)?,
        Some("json") => export_report_to_json(report, path)?,
        _ => export_report_to_csv(report, path)?,
    }

    log::info!("Sync report exported to: {}", path.display());
    Ok(())
}

fn export_report_to_json(report: &SyncReport, path: &Path) -> Result<()> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        #[serde(flatten)]
        report: &'a SyncReport,
        summary: SyncSummary,
    }

    let content = serde_json::to_string_pretty(&JsonReport {
        report,
        summary: report.summary(),
    })
    .context("Failed to serialize report")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

const ROW_HEADERS: [&str; 7] = [
    "Row", "Key", "Action", "Target", "Status", "Item ID", "Error",
];

fn outcome_record(outcome: &RowOutcome) -> [String; 7] {
    [
        outcome.row_number.to_string(),
        outcome.key.clone(),
        outcome.action_kind().to_string(),
        outcome.target(),
        outcome.status.to_string(),
        outcome.item_id.clone().unwrap_or_default(),
        outcome.error.clone().unwrap_or_default(),
    ]
}

fn export_report_to_csv(report: &SyncReport, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    wtr.write_record(ROW_HEADERS)
        .context("Failed to write CSV header")?;

    for outcome in &report.outcomes {
        wtr.write_record(outcome_record(outcome))
            .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn export_report_to_excel(report: &SyncReport, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    create_summary_sheet(&mut workbook, report)?;
    create_rows_sheet(&mut workbook, report)?;

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    Ok(())
}

fn create_summary_sheet(workbook: &mut Workbook, report: &SyncReport) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;

    let title_format = Format::new().set_bold().set_font_size(16);
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White);

    let mode = if report.dry_run { " (dry run)" } else { "" };
    sheet.write_string_with_format(
        0,
        0,
        &format!("Board Sync Report: board {}{}", report.board_id, mode),
        &title_format,
    )?;
    sheet.write_string(1, 0, &format!("Generated: {}", report.sync_date))?;

    sheet.write_string_with_format(3, 0, "Metric", &header_format)?;
    sheet.write_string_with_format(3, 1, "Value", &header_format)?;

    let summary = report.summary();
    let metrics = [
        ("Indexed Items", report.indexed_items),
        ("Rows", summary.rows),
        ("Created", summary.created),
        ("Updated", summary.updated),
        ("Failed", summary.failed),
        ("Planned", summary.planned),
        ("Skipped", summary.skipped),
    ];

    for (offset, (label, value)) in metrics.iter().enumerate() {
        let row = 4 + offset as u32;
        sheet.write_string(row, 0, *label)?;
        sheet.write_number(row, 1, *value as f64)?;
    }

    sheet.set_column_width(0, 20)?;
    Ok(())
}

fn create_rows_sheet(workbook: &mut Workbook, report: &SyncReport) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Rows")?;

    let bold_format = Format::new().set_bold();
    let failed_format = Format::new().set_font_color(Color::Red);

    for (col, header) in ROW_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold_format)?;
    }

    for (idx, outcome) in report.outcomes.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in outcome_record(outcome).iter().enumerate() {
            if outcome.is_failure() {
                sheet.write_string_with_format(row, col as u16, value, &failed_format)?;
            } else {
                sheet.write_string(row, col as u16, value)?;
            }
        }
    }

    sheet.set_column_width(1, 30)?;
    sheet.set_column_width(6, 60)?;
    Ok(())
}
