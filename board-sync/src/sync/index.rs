//! Lookup table from normalized identifying-column text to board item id

use std::collections::HashMap;

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::fetch::{FetchedItems, RemoteItem};

/// What to do when two board items normalize to the same key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later items overwrite earlier ones
    #[default]
    LastWins,
    /// The first item seen keeps the key
    FirstWins,
    /// Refuse to build the index
    Error,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::LastWins => write!(f, "last-wins"),
            DuplicatePolicy::FirstWins => write!(f, "first-wins"),
            DuplicatePolicy::Error => write!(f, "error"),
        }
    }
}

/// Trim and lowercase. Idempotent.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A key that mapped to more than one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub key: String,
    pub kept_id: String,
    pub dropped_id: String,
}

/// Normalized key -> item id, built once per run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemIndex {
    entries: HashMap<String, String>,
    #[serde(skip)]
    duplicates: Vec<DuplicateKey>,
    #[serde(skip)]
    skipped: usize,
}

impl ItemIndex {
    /// Build the index from fetched items.
    ///
    /// Items without a non-blank value in `identifying_column` are skipped.
    pub fn build(
        fetched: &FetchedItems,
        identifying_column: &str,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        if !fetched.board_found {
            log::info!("No items found on board");
            return Ok(Self::default());
        }

        let mut index = Self::default();
        for item in &fetched.items {
            index.insert_item(item, identifying_column, policy)?;
        }

        if !index.duplicates.is_empty() {
            log::warn!(
                "{} duplicate key(s) on board resolved with policy {}",
                index.duplicates.len(),
                policy
            );
        }

        log::info!(
            "Indexed {} of {} board items ({} without '{}')",
            index.len(),
            fetched.items.len(),
            index.skipped,
            identifying_column
        );
        log::debug!(
            "Existing items (map): {}",
            serde_json::to_string_pretty(&index.entries).unwrap_or_default()
        );

        Ok(index)
    }

    fn insert_item(
        &mut self,
        item: &RemoteItem,
        identifying_column: &str,
        policy: DuplicatePolicy,
    ) -> Result<()> {
        let key = match item
            .column_text(identifying_column)
            .map(normalize_key)
            .filter(|k| !k.is_empty())
        {
            Some(key) => key,
            None => {
                self.skipped += 1;
                return Ok(());
            }
        };

        match self.entries.get(&key) {
            None => {
                self.entries.insert(key, item.id.clone());
            }
            Some(existing) => {
                let existing = existing.clone();
                log::warn!(
                    "Duplicate key '{}' on board: items {} and {}",
                    key,
                    existing,
                    item.id
                );
                match policy {
                    DuplicatePolicy::LastWins => {
                        self.duplicates.push(DuplicateKey {
                            key: key.clone(),
                            kept_id: item.id.clone(),
                            dropped_id: existing,
                        });
                        self.entries.insert(key, item.id.clone());
                    }
                    DuplicatePolicy::FirstWins => {
                        self.duplicates.push(DuplicateKey {
                            key,
                            kept_id: existing,
                            dropped_id: item.id.clone(),
                        });
                    }
                    DuplicatePolicy::Error => {
                        bail!(
                            "Duplicate key '{}' on board (items {} and {})",
                            key,
                            existing,
                            item.id
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Build directly from key/id pairs, applying last-wins
    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Item id for an already-normalized key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates(&self) -> &[DuplicateKey] {
        &self.duplicates
    }

    /// Items skipped for lacking an identifying value
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Entries sorted by key, for stable output
    pub fn sorted_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }
}
