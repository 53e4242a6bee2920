//! Read sync rows from a spreadsheet file
//!
//! Row 1 is a header. Columns A-F are read from row 2 through the last
//! populated row; trailing blank rows are dropped.

use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::sync::row::{ROW_WIDTH, SpreadsheetRow};

/// Read rows from `.csv`, `.xlsx`, `.xlsm`, `.xls` or `.ods`
pub fn read_rows(path: &Path, sheet_name: Option<&str>) -> Result<Vec<SpreadsheetRow>> {
    if !path.exists() {
        bail!("Spreadsheet does not exist: {}", path.display());
    }

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let rows = if is_csv {
        if sheet_name.is_some() {
            log::warn!("Ignoring sheet name for CSV input {}", path.display());
        }
        read_csv_rows(path)?
    } else {
        read_workbook_rows(path, sheet_name)?
    };

    log::info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_workbook_rows(path: &Path, sheet_name: Option<&str>) -> Result<Vec<SpreadsheetRow>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;

    let sheet_names = workbook.sheet_names();
    let sheet = match sheet_name {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                bail!(
                    "Sheet '{}' not found in {} (available: {})",
                    name,
                    path.display(),
                    sheet_names.join(", ")
                );
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .context("Spreadsheet has no sheets")?,
    };

    log::debug!("Reading sheet '{}' from {}", sheet, path.display());

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Failed to read sheet: {}", sheet))?;

    Ok(rows_from_range(&range))
}

/// Rows 2..=last of columns A-F, addressed absolutely so that a blank
/// leading column or row does not shift the cells
fn rows_from_range(range: &Range<Data>) -> Vec<SpreadsheetRow> {
    let last_row = match range.end() {
        Some((row, _)) => row,
        None => return Vec::new(),
    };

    let rows = (1..=last_row)
        .map(|abs_row| {
            let cells = (0..ROW_WIDTH as u32).map(|abs_col| {
                range
                    .get_value((abs_row, abs_col))
                    .map(cell_to_string)
                    .unwrap_or_default()
            });
            SpreadsheetRow::new(abs_row as usize + 1, cells)
        })
        .collect();

    trim_trailing_blank(rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<SpreadsheetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read CSV record {}", idx + 2))?;
        let number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        rows.push(SpreadsheetRow::new(
            number,
            record.iter().take(ROW_WIDTH).map(str::to_string),
        ));
    }

    Ok(trim_trailing_blank(rows))
}

fn trim_trailing_blank(mut rows: Vec<SpreadsheetRow>) -> Vec<SpreadsheetRow> {
    while rows.last().is_some_and(SpreadsheetRow::is_blank) {
        rows.pop();
    }
    rows
}

/// Convert a cell to the text the sync works with
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Whole numbers without a trailing ".0"
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::Float(42.0)), "42");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(-3)), "-3");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
        assert_eq!(cell_to_string(&Data::String(" x ".to_string())), " x ");
    }

    #[test]
    fn test_read_csv_skips_header_and_pads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(
            &path,
            "Name,Email,Role,Team,Status,Notes\n\
             ,Alice@Example.com ,Manager,,Active\n\
             Bob,bob@example.com,Dev,Core,Active,extra,ignored\n\
             ,,,,,\n",
        )
        .unwrap();

        let rows = read_rows(&path, None).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[0].cell(1), "Alice@Example.com ");
        assert_eq!(rows[0].cell(5), "");

        assert_eq!(rows[1].number, 3);
        assert_eq!(rows[1].cell(0), "Bob");
        assert_eq!(rows[1].cell(5), "extra");
    }

    #[test]
    fn test_read_xlsx_uses_absolute_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("People").unwrap();
        // Column A left empty everywhere; B-E hold data
        sheet.write_string(0, 1, "Email").unwrap();
        sheet.write_string(1, 1, "alice@example.com").unwrap();
        sheet.write_string(1, 2, "Manager").unwrap();
        sheet.write_number(1, 4, 7.0).unwrap();
        sheet.write_string(3, 1, "carol@example.com").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_rows(&path, Some("People")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[0].cell(0), "");
        assert_eq!(rows[0].cell(1), "alice@example.com");
        assert_eq!(rows[0].cell(4), "7");
        assert!(rows[1].is_blank());
        assert_eq!(rows[2].number, 4);

        assert!(read_rows(&path, Some("Missing")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = read_rows(Path::new("/nonexistent/sheet.xlsx"), None).unwrap_err();
        assert!(err.to_string().contains("Spreadsheet does not exist"));
    }
}
