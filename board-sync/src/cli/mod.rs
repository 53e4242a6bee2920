//! Command-line interface

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::sync::DuplicatePolicy;
use commands::{FetchCommands, SyncCommands};

#[derive(Parser, Debug)]
#[command(name = "board-sync", version, about = "Sync spreadsheet rows into monday.com board items")]
pub struct Cli {
    /// Config file (defaults to <config dir>/board-sync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update board items from spreadsheet rows
    Sync(SyncCommands),
    /// Fetch the board and print the key -> item id index
    Fetch(FetchCommands),
}

/// Connection and board flags shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct BoardArgs {
    /// API key (prefer the config file or BOARD_SYNC_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Target board id
    #[arg(long)]
    pub board_id: Option<String>,

    /// GraphQL endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Items requested per page (1-500)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Fail instead of fetching more than this many pages
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// How to resolve board items sharing the same key
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicatePolicy>,
}

impl BoardArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            board_id: self.board_id.clone(),
            endpoint: self.endpoint.clone(),
            page_size: self.page_size,
            max_pages: self.max_pages,
            duplicates: self.duplicates,
            ..ConfigOverrides::default()
        }
    }
}

/// Dispatch the parsed command line
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Sync(args) => commands::sync::handle_sync_command(args, config_path).await,
        Commands::Fetch(args) => commands::fetch::handle_fetch_command(args, config_path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_command() {
        let cli = Cli::try_parse_from([
            "board-sync",
            "-vv",
            "sync",
            "people.xlsx",
            "--sheet",
            "People",
            "--board-id",
            "42",
            "--duplicates",
            "first-wins",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.spreadsheet, PathBuf::from("people.xlsx"));
                assert_eq!(args.sheet.as_deref(), Some("People"));
                assert!(args.dry_run);

                let overrides = args.overrides();
                assert_eq!(overrides.board_id.as_deref(), Some("42"));
                assert_eq!(overrides.duplicates, Some(DuplicatePolicy::FirstWins));
                assert_eq!(overrides.dry_run, Some(true));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_absent_leave_overrides_unset() {
        let cli = Cli::try_parse_from(["board-sync", "sync", "rows.csv"]).unwrap();
        match cli.command {
            Commands::Sync(args) => {
                let overrides = args.overrides();
                assert!(overrides.api_key.is_none());
                assert!(overrides.dry_run.is_none());
                assert!(overrides.skip_blank_rows.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_fetch_command() {
        let cli =
            Cli::try_parse_from(["board-sync", "fetch", "--output", "index.json", "--max-pages", "3"])
                .unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.output, Some(PathBuf::from("index.json")));
                assert_eq!(args.board.max_pages, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
