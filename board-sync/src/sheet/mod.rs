//! Spreadsheet input

mod reader;

pub use reader::read_rows;
