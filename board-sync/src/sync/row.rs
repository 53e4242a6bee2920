//! Spreadsheet rows and the column values sent for them

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use super::index::normalize_key;
use crate::config::ColumnLayout;

/// Cells read per row (columns A-F)
pub const ROW_WIDTH: usize = 6;

/// Item name used when the display-name cell is blank
pub const EMPTY_NAME_SENTINEL: &str = "N/A";

/// Placeholder for blank attribute cells the API refuses as empty strings
pub const BLANK_PLACEHOLDER: &str = " ";

/// One spreadsheet row, columns A-F as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpreadsheetRow {
    /// 1-based row number in the sheet
    pub number: usize,
    pub cells: [String; ROW_WIDTH],
}

impl SpreadsheetRow {
    /// Build a row, padding missing cells with "" and ignoring extra ones
    pub fn new<I, S>(number: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: [String; ROW_WIDTH] = Default::default();
        for (slot, cell) in row.iter_mut().zip(cells) {
            *slot = cell.into();
        }
        Self { number, cells: row }
    }

    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// True when every cell is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Trimmed and substituted values for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFields {
    /// Column A, or "N/A" when blank
    pub display_name: String,
    /// Column B trimmed and lowercased; the lookup key
    pub key: String,
    pub field3: String,
    pub field4: String,
    pub field5: String,
}

impl RowFields {
    pub fn from_row(row: &SpreadsheetRow) -> Self {
        let display_name = row.cell(0).trim();
        Self {
            display_name: if display_name.is_empty() {
                EMPTY_NAME_SENTINEL.to_string()
            } else {
                display_name.to_string()
            },
            key: normalize_key(row.cell(1)),
            field3: row.cell(2).trim().to_string(),
            field4: row.cell(3).trim().to_string(),
            field5: row.cell(4).trim().to_string(),
        }
    }
}

/// Column id -> value for the five attribute columns, in column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnValuesPayload(Map<String, Value>);

impl ColumnValuesPayload {
    /// Columns 1-3 go as-is; blank columns 4 and 5 become a single space
    pub fn from_fields(fields: &RowFields, columns: &ColumnLayout) -> Self {
        let values = [
            fields.display_name.as_str(),
            fields.key.as_str(),
            fields.field3.as_str(),
            non_empty_or_placeholder(&fields.field4),
            non_empty_or_placeholder(&fields.field5),
        ];

        let map = columns
            .ids
            .iter()
            .zip(values)
            .map(|(id, value)| (id.clone(), Value::String(value.to_string())))
            .collect();

        Self(map)
    }

    #[cfg(test)]
    pub fn get(&self, column_id: &str) -> Option<&str> {
        self.0.get(column_id).and_then(Value::as_str)
    }

    /// JSON text for the `JSON` scalar argument of the mutations
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0).context("Failed to serialize column values")
    }
}

fn non_empty_or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        BLANK_PLACEHOLDER
    } else {
        value
    }
}
