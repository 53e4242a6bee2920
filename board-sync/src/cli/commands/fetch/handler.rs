//! Fetch command handler: dump the board's key index

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::*;
use serde_json::{Map, Value, json};

use super::FetchCommands;
use crate::api::BoardClient;
use crate::config::{ConfigOverrides, load_config_file};
use crate::sync::{ItemIndex, build_index};

pub async fn handle_fetch_command(
    args: FetchCommands,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let config = load_config_file(config_path)?
        .resolve(&ConfigOverrides::from_env(), &args.board.overrides())
        .context("Invalid configuration")?;

    let client = BoardClient::new(&config.api)?;
    let index = build_index(&client, &config).await?;

    let rendered = serde_json::to_string_pretty(&index_json(&index))
        .context("Failed to serialize item index")?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write index: {}", path.display()))?;
            eprintln!(
                "Wrote {} keys to {}",
                index.len().to_string().bold(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", rendered),
    }

    if !index.duplicates().is_empty() {
        eprintln!(
            "{} {} duplicate keys on board {}",
            "Warning:".yellow().bold(),
            index.duplicates().len(),
            config.board.board_id
        );
    }
    if index.skipped() > 0 {
        eprintln!("{} items had no key and were skipped", index.skipped());
    }

    Ok(ExitCode::SUCCESS)
}

fn index_json(index: &ItemIndex) -> Value {
    let entries: Map<String, Value> = index
        .sorted_entries()
        .into_iter()
        .map(|(key, id)| (key.to_string(), Value::String(id.to_string())))
        .collect();

    json!({
        "items": entries,
        "duplicates": index.duplicates(),
        "skipped": index.skipped(),
    })
}
