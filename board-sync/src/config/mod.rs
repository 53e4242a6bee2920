//! Sync configuration
//!
//! Settings are layered: TOML file, then environment variables, then CLI flags.
//! The resolved [`SyncConfig`] is passed explicitly to every component.

pub mod file;

pub use file::{ConfigOverrides, load_config_file};

use anyhow::{Result, bail};

use crate::sync::index::DuplicatePolicy;

pub const DEFAULT_ENDPOINT: &str = "https://api.monday.com/v2";
/// Largest page the API hands out per request
pub const MAX_PAGE_SIZE: u32 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COLUMN_IDS: [&str; 5] =
    ["column_01", "column_02", "column_03", "column_04", "column_05"];
pub const DEFAULT_IDENTIFYING_COLUMN: &str = "column_02";

pub const ENV_API_KEY: &str = "BOARD_SYNC_API_KEY";
pub const ENV_BOARD_ID: &str = "BOARD_SYNC_BOARD_ID";
pub const ENV_ENDPOINT: &str = "BOARD_SYNC_ENDPOINT";

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api: ApiSettings,
    pub board: BoardSettings,
    pub options: SyncOptions,
}

/// Connection settings for the GraphQL endpoint
#[derive(Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Target board and how its items are fetched
#[derive(Debug, Clone)]
pub struct BoardSettings {
    pub board_id: String,
    /// Items requested per page
    pub page_size: u32,
    /// Upper bound on pages; exceeding it is a fatal error. `None` fetches all pages.
    pub max_pages: Option<u32>,
    pub columns: ColumnLayout,
}

/// Board column ids for spreadsheet columns A-E
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Column id per attribute field, in spreadsheet order
    pub ids: [String; 5],
    /// Column whose text identifies an item (the natural key)
    pub identifying: String,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            ids: DEFAULT_COLUMN_IDS.map(String::from),
            identifying: DEFAULT_IDENTIFYING_COLUMN.to_string(),
        }
    }
}

impl ColumnLayout {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Behavioural switches for the row processor and index builder
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub duplicates: DuplicatePolicy,
    /// Skip rows whose cells are all empty instead of creating "N/A" items
    pub skip_blank_rows: bool,
    /// Plan every row without sending mutations
    pub dry_run: bool,
    /// Worksheet to read; first sheet when unset
    pub sheet_name: Option<String>,
}

impl SyncConfig {
    /// Create a new builder for SyncConfig
    pub fn builder(api_key: impl Into<String>, board_id: impl Into<String>) -> SyncConfigBuilder {
        SyncConfigBuilder::new(api_key, board_id)
    }
}

/// Builder for SyncConfig
#[derive(Debug)]
pub struct SyncConfigBuilder {
    api: ApiSettings,
    board: BoardSettings,
    options: SyncOptions,
}

impl SyncConfigBuilder {
    pub fn new(api_key: impl Into<String>, board_id: impl Into<String>) -> Self {
        Self {
            api: ApiSettings {
                api_key: api_key.into(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            board: BoardSettings {
                board_id: board_id.into(),
                page_size: MAX_PAGE_SIZE,
                max_pages: None,
                columns: ColumnLayout::default(),
            },
            options: SyncOptions::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api.endpoint = endpoint.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.api.timeout_secs = secs;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.board.page_size = size;
        self
    }

    pub fn max_pages(mut self, max: Option<u32>) -> Self {
        self.board.max_pages = max;
        self
    }

    pub fn columns(mut self, columns: ColumnLayout) -> Self {
        self.board.columns = columns;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.options.duplicates = policy;
        self
    }

    pub fn skip_blank_rows(mut self, enabled: bool) -> Self {
        self.options.skip_blank_rows = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.options.dry_run = enabled;
        self
    }

    pub fn sheet_name(mut self, name: Option<String>) -> Self {
        self.options.sheet_name = name;
        self
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<SyncConfig> {
        let api_key = self.api.api_key.trim().to_string();
        if api_key.is_empty() {
            bail!(
                "No API key configured. Set [api] key in the config file, {} or --api-key",
                ENV_API_KEY
            );
        }

        let board_id = self.board.board_id.trim().to_string();
        if board_id.is_empty() {
            bail!(
                "No board id configured. Set [board] id in the config file, {} or --board-id",
                ENV_BOARD_ID
            );
        }
        if !board_id.chars().all(|c| c.is_ascii_digit()) {
            bail!("Board id must be numeric, got '{}'", board_id);
        }

        if !(self.api.endpoint.starts_with("https://") || self.api.endpoint.starts_with("http://")) {
            bail!("Endpoint must be an http(s) URL, got '{}'", self.api.endpoint);
        }

        if self.board.page_size == 0 || self.board.page_size > MAX_PAGE_SIZE {
            bail!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.board.page_size
            );
        }

        if self.board.max_pages == Some(0) {
            bail!("max_pages must be at least 1");
        }

        let columns = &self.board.columns;
        for (i, id) in columns.ids.iter().enumerate() {
            if id.trim().is_empty() {
                bail!("Column id #{} is empty", i + 1);
            }
            if columns.ids[..i].contains(id) {
                bail!("Column id '{}' is listed twice", id);
            }
        }
        if !columns.ids.contains(&columns.identifying) {
            bail!(
                "Identifying column '{}' must be one of the configured columns {:?}",
                columns.identifying,
                columns.ids
            );
        }

        Ok(SyncConfig {
            api: ApiSettings {
                api_key,
                ..self.api
            },
            board: BoardSettings {
                board_id,
                ..self.board
            },
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = SyncConfig::builder("key", "123").build().unwrap();

        assert_eq!(config.api.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.board.page_size, 500);
        assert_eq!(config.board.max_pages, None);
        assert_eq!(config.board.columns.identifying, "column_02");
        assert_eq!(config.options.duplicates, DuplicatePolicy::LastWins);
        assert!(!config.options.dry_run);
        assert!(!config.options.skip_blank_rows);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SyncConfig::builder(" key ", " 42 ")
            .endpoint("http://localhost:8080/v2")
            .page_size(100)
            .max_pages(Some(3))
            .duplicates(DuplicatePolicy::FirstWins)
            .dry_run(true)
            .build()
            .unwrap();

        assert_eq!(config.api.api_key, "key");
        assert_eq!(config.board.board_id, "42");
        assert_eq!(config.board.page_size, 100);
        assert_eq!(config.board.max_pages, Some(3));
        assert_eq!(config.options.duplicates, DuplicatePolicy::FirstWins);
        assert!(config.options.dry_run);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(SyncConfig::builder("", "1").build().is_err());
        assert!(SyncConfig::builder("key", "  ").build().is_err());
        assert!(SyncConfig::builder("key", "BOARDIDMONDAY").build().is_err());
    }

    #[test]
    fn test_page_bounds() {
        assert!(SyncConfig::builder("k", "1").page_size(0).build().is_err());
        assert!(SyncConfig::builder("k", "1").page_size(501).build().is_err());
        assert!(SyncConfig::builder("k", "1").max_pages(Some(0)).build().is_err());
    }

    #[test]
    fn test_identifying_column_must_be_listed() {
        let columns = ColumnLayout {
            identifying: "email".to_string(),
            ..ColumnLayout::default()
        };
        assert!(SyncConfig::builder("k", "1").columns(columns).build().is_err());
    }

    #[test]
    fn test_duplicate_column_ids_rejected() {
        let mut columns = ColumnLayout::default();
        columns.ids[4] = "column_01".to_string();
        assert!(SyncConfig::builder("k", "1").columns(columns).build().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = SyncConfig::builder("super-secret", "1").build().unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
    }
}
