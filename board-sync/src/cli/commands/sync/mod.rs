mod handler;

pub use handler::handle_sync_command;

use std::path::PathBuf;

use clap::Args;

use crate::cli::BoardArgs;
use crate::config::ConfigOverrides;

#[derive(Args, Debug)]
pub struct SyncCommands {
    /// Spreadsheet to read (.xlsx, .xlsm, .xls, .ods or .csv)
    pub spreadsheet: PathBuf,

    /// Worksheet name (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Decide create/update per row without sending mutations
    #[arg(long)]
    pub dry_run: bool,

    /// Skip rows with no values instead of creating "N/A" items
    #[arg(long)]
    pub skip_blank_rows: bool,

    /// Write per-row outcomes to this file (.xlsx, .json, otherwise CSV)
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub board: BoardArgs,
}

impl SyncCommands {
    /// Flags that override file and environment settings
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            sheet_name: self.sheet.clone(),
            skip_blank_rows: self.skip_blank_rows.then_some(true),
            dry_run: self.dry_run.then_some(true),
            ..self.board.overrides()
        }
    }
}
