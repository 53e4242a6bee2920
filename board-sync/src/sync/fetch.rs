//! Fetch existing items from the target board.
//!
//! This module handles:
//! - Cursor-based fetching of board items (`page_size` per request)
//! - Parsing raw responses into [`RemoteItem`]s
//! - Treating a response without the board/items structure as "no items"

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::{GraphqlTransport, queries};
use crate::config::BoardSettings;

/// A board item as returned by the items query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub column_values: Vec<ColumnValue>,
}

/// Display text of one column on an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl RemoteItem {
    /// Text of the column with the given id, if present and not null
    pub fn column_text(&self, column_id: &str) -> Option<&str> {
        self.column_values
            .iter()
            .find(|c| c.id == column_id)
            .and_then(|c| c.text.as_deref())
    }
}

/// Ids are strings in the API but numbers are accepted too
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected item id, got {}",
            other
        ))),
    }
}

/// All items gathered across pages
#[derive(Debug, Clone, Default)]
pub struct FetchedItems {
    /// Whether any response carried the expected board/items structure
    pub board_found: bool,
    pub items: Vec<RemoteItem>,
    /// Number of pages that carried items
    pub pages: u32,
}

/// One page of items plus the cursor for the next one
#[derive(Debug, Clone, Default)]
pub struct ItemsPage {
    pub cursor: Option<String>,
    pub items: Vec<RemoteItem>,
}

/// Extract items from a first-page (`data.boards[0].items_page`) or
/// follow-up (`data.next_items_page`) response.
///
/// Returns `None` when the structure is absent. Malformed individual items
/// are logged and dropped.
pub fn parse_items_page(response: &Value) -> Option<ItemsPage> {
    let page = response
        .pointer("/data/boards/0/items_page")
        .or_else(|| response.pointer("/data/next_items_page"))
        .filter(|p| !p.is_null())?;

    let raw_items = page.get("items")?.as_array()?;

    let items = raw_items
        .iter()
        .filter_map(|raw| match RemoteItem::deserialize(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping malformed board item {}: {}", raw, e);
                None
            }
        })
        .collect();

    let cursor = page
        .get("cursor")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Some(ItemsPage { cursor, items })
}

/// Log GraphQL-level errors carried in an otherwise readable response
pub(crate) fn graphql_errors(response: &Value) -> Vec<String> {
    response
        .get("errors")
        .and_then(|e| e.as_array())
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fetch every item on the board, following cursors.
///
/// Transport failures and non-JSON bodies are fatal. A first response without
/// the items structure means an empty board. Once a cursor has promised more
/// items, an unreadable follow-up page, a repeated cursor, or a cursor still
/// present after `max_pages` pages is fatal, so the index is never partial.
pub async fn fetch_existing_items(
    transport: &dyn GraphqlTransport,
    board: &BoardSettings,
) -> Result<FetchedItems> {
    let column_ids = board.columns.ids();
    let mut request = queries::items_first_page(&board.board_id, board.page_size, column_ids);
    let mut fetched = FetchedItems::default();
    let mut previous_cursor: Option<String> = None;

    loop {
        let page_number = fetched.pages + 1;
        let response = transport
            .send(&request)
            .await
            .with_context(|| format!("Failed to fetch items of board {}", board.board_id))?;

        let json = response
            .json()
            .with_context(|| format!("Failed to parse items page {}", page_number))?;

        log::debug!(
            "Items query response (page {}): {}",
            page_number,
            serde_json::to_string_pretty(&json).unwrap_or_default()
        );

        if !response.is_success() {
            log::warn!("Items query returned HTTP {}", response.status);
        }
        let errors = graphql_errors(&json);
        for message in &errors {
            log::warn!("Items query error: {}", message);
        }

        let page = match parse_items_page(&json) {
            Some(page) => page,
            None if fetched.pages == 0 => {
                log::warn!(
                    "Response for board {} has no items structure, treating as empty",
                    board.board_id
                );
                break;
            }
            None => {
                let reason = if errors.is_empty() {
                    format!("HTTP {}, no items structure", response.status)
                } else {
                    errors.join("; ")
                };
                bail!(
                    "Board {} has more items than fetched: page {} could not be read ({})",
                    board.board_id,
                    page_number,
                    reason
                );
            }
        };

        fetched.board_found = true;
        fetched.pages = page_number;
        log::debug!(
            "Fetched {} items on page {}, has_next={}",
            page.items.len(),
            page_number,
            page.cursor.is_some()
        );
        fetched.items.extend(page.items);

        let cursor = match page.cursor {
            Some(cursor) => cursor,
            None => break,
        };
        if previous_cursor.as_deref() == Some(cursor.as_str()) {
            bail!(
                "Board {} returned cursor '{}' twice in a row after page {}",
                board.board_id,
                cursor,
                fetched.pages
            );
        }

        if let Some(max_pages) = board.max_pages {
            if fetched.pages >= max_pages {
                bail!(
                    "Board {} has more items than fetched: stopped after {} page(s) ({} items) \
                     with more pages remaining; raise max_pages",
                    board.board_id,
                    fetched.pages,
                    fetched.items.len()
                );
            }
        }

        request = queries::items_next_page(&cursor, board.page_size, column_ids);
        previous_cursor = Some(cursor);
    }

    log::info!(
        "Fetched {} existing items from board {} in {} page(s)",
        fetched.items.len(),
        board.board_id,
        fetched.pages
    );

    Ok(fetched)
}
