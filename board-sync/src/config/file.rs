//! TOML config file and override layers

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use super::{ColumnLayout, ENV_API_KEY, ENV_BOARD_ID, ENV_ENDPOINT, SyncConfig};
use crate::sync::index::DuplicatePolicy;

/// On-disk configuration. Every field is optional so partial files work.
///
/// ```toml
/// [api]
/// key = "..."
/// endpoint = "https://api.monday.com/v2"
/// timeout_secs = 30
///
/// [board]
/// id = 1234567890
/// page_size = 500
/// max_pages = 20
/// columns = ["column_01", "column_02", "column_03", "column_04", "column_05"]
/// identifying_column = "column_02"
///
/// [sync]
/// duplicates = "last-wins"
/// skip_blank_rows = false
/// sheet = "Sheet1"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub api: ApiSection,
    pub board: BoardSection,
    pub sync: SyncSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
    pub key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardSection {
    pub id: Option<BoardId>,
    pub page_size: Option<u32>,
    pub max_pages: Option<u32>,
    pub columns: Option<Vec<String>>,
    pub identifying_column: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSection {
    pub duplicates: Option<DuplicatePolicy>,
    pub skip_blank_rows: Option<bool>,
    pub sheet: Option<String>,
}

/// Board ids are numeric but may be quoted in TOML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BoardId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for BoardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardId::Number(n) => write!(f, "{}", n),
            BoardId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Values that take precedence over the config file (environment or CLI)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub board_id: Option<String>,
    pub endpoint: Option<String>,
    pub page_size: Option<u32>,
    pub max_pages: Option<u32>,
    pub duplicates: Option<DuplicatePolicy>,
    pub sheet_name: Option<String>,
    pub skip_blank_rows: Option<bool>,
    pub dry_run: Option<bool>,
}

impl ConfigOverrides {
    /// Read overrides from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty(ENV_API_KEY),
            board_id: non_empty(ENV_BOARD_ID),
            endpoint: non_empty(ENV_ENDPOINT),
            ..Self::default()
        }
    }
}

impl ConfigFile {
    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Layer overrides on top of this file; set values win
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(key) = &overrides.api_key {
            self.api.key = Some(key.clone());
        }
        if let Some(endpoint) = &overrides.endpoint {
            self.api.endpoint = Some(endpoint.clone());
        }
        if let Some(id) = &overrides.board_id {
            self.board.id = Some(BoardId::Text(id.clone()));
        }
        if let Some(size) = overrides.page_size {
            self.board.page_size = Some(size);
        }
        if let Some(max) = overrides.max_pages {
            self.board.max_pages = Some(max);
        }
        if let Some(policy) = overrides.duplicates {
            self.sync.duplicates = Some(policy);
        }
        if let Some(sheet) = &overrides.sheet_name {
            self.sync.sheet = Some(sheet.clone());
        }
        if let Some(skip) = overrides.skip_blank_rows {
            self.sync.skip_blank_rows = Some(skip);
        }
    }

    /// Validate into a resolved configuration
    pub fn into_config(self, dry_run: bool) -> Result<SyncConfig> {
        let mut columns = ColumnLayout::default();
        if let Some(ids) = self.board.columns {
            let count = ids.len();
            columns.ids = ids.try_into().map_err(|_| {
                anyhow::anyhow!("Exactly 5 column ids are required, got {}", count)
            })?;
        }
        if let Some(identifying) = self.board.identifying_column {
            columns.identifying = identifying;
        }

        let mut builder = SyncConfig::builder(
            self.api.key.unwrap_or_default(),
            self.board.id.map(|id| id.to_string()).unwrap_or_default(),
        )
        .columns(columns)
        .max_pages(self.board.max_pages)
        .duplicates(self.sync.duplicates.unwrap_or_default())
        .skip_blank_rows(self.sync.skip_blank_rows.unwrap_or(false))
        .sheet_name(self.sync.sheet)
        .dry_run(dry_run);

        if let Some(endpoint) = self.api.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(secs) = self.api.timeout_secs {
            builder = builder.timeout_secs(secs);
        }
        if let Some(size) = self.board.page_size {
            builder = builder.page_size(size);
        }

        builder.build()
    }

    /// Resolve file, environment and CLI layers into a SyncConfig
    pub fn resolve(
        mut self,
        env: &ConfigOverrides,
        cli: &ConfigOverrides,
    ) -> Result<SyncConfig> {
        self.apply(env);
        self.apply(cli);
        let dry_run = cli.dry_run.or(env.dry_run).unwrap_or(false);
        self.into_config(dry_run)
    }
}

/// `<config dir>/board-sync/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("board-sync").join("config.toml"))
}

/// Load the config file.
///
/// An explicit path must exist. Without one, the default location is used if
/// present, otherwise an empty config is returned.
pub fn load_config_file(path: Option<&Path>) -> Result<ConfigFile> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file does not exist: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                log::debug!("No config file found, using defaults");
                return Ok(ConfigFile::default());
            }
        },
    };

    log::debug!("Loading config from {}", path.display());

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    ConfigFile::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}
