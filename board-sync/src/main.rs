use std::process::ExitCode;

use clap::Parser;
use colored::*;

mod api;
mod cli;
mod config;
mod sheet;
mod sync;

use cli::Cli;

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn,board_sync=info",
        1 => "warn,board_sync=debug",
        _ => "info,board_sync=trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
