mod handler;

pub use handler::handle_fetch_command;

use std::path::PathBuf;

use clap::Args;

use crate::cli::BoardArgs;

#[derive(Args, Debug)]
pub struct FetchCommands {
    /// Write the index as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub board: BoardArgs,
}
