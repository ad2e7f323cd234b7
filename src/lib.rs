//! # sheetjson
//!
//! Convert the first sheet of an Excel workbook to a JSON array of records.
//!
//! The first non-blank row of the sheet is the header row; every later row
//! becomes one JSON object keyed by those headers, in sheet order.
//!
//! ## Quick Start
//!
//! ```no_run
//! // Whole pipeline: read, build records, serialize
//! let json = sheetjson::convert("zongce.xlsx")?;
//! println!("{}", json);
//!
//! // Access the table first
//! let table = sheetjson::read_table("zongce.xlsx")?;
//! println!("Columns: {:?}", table.headers);
//! println!("Rows: {}", table.len());
//! # Ok::<(), sheetjson::Error>(())
//! ```
//!
//! ## Features
//!
//! - `xlsx` (default): Office Open XML workbook support (.xlsx, .xlsm)

pub mod container;
pub mod detect;
pub mod error;
pub mod model;

#[cfg(feature = "xlsx")]
pub mod xlsx;

pub mod render;

// Re-exports
pub use container::{OoxmlContainer, Relationship, Relationships};
pub use detect::{detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, Result};
pub use model::{CellValue, Grid, Record, Table};

use std::path::Path;

/// The workbook read when no path is given.
pub const DEFAULT_INPUT: &str = "zongce.xlsx";

/// Read the first sheet of a workbook file into a table.
///
/// # Example
///
/// ```no_run
/// let table = sheetjson::read_table("zongce.xlsx")?;
/// for record in table.records() {
///     println!("{:?}", record.get("姓名"));
/// }
/// # Ok::<(), sheetjson::Error>(())
/// ```
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading workbook");
    let data = std::fs::read(path)?;
    read_table_from_bytes(data)
}

/// Read the first sheet of an in-memory workbook into a table.
pub fn read_table_from_bytes(data: Vec<u8>) -> Result<Table> {
    let format = detect_format_from_bytes(&data)?;

    match format {
        #[cfg(feature = "xlsx")]
        FormatType::Xlsx | FormatType::Xlsm => {
            let parser = xlsx::XlsxParser::from_bytes(data)?;
            let grid = parser.first_sheet()?;
            let table = Table::from_grid(&grid)?;
            tracing::debug!(
                sheet = %grid.name,
                columns = table.headers.len(),
                rows = table.len(),
                "built table"
            );
            Ok(table)
        }
        #[cfg(not(feature = "xlsx"))]
        _ => Err(Error::UnsupportedFormat(format!("{:?}", format))),
    }
}

/// Convert the first sheet of a workbook file to compact JSON.
///
/// The result is a JSON array with one object per data row. It carries no
/// trailing newline.
///
/// # Example
///
/// ```no_run
/// let json = sheetjson::convert("zongce.xlsx")?;
/// assert!(json.starts_with('['));
/// # Ok::<(), sheetjson::Error>(())
/// ```
pub fn convert(path: impl AsRef<Path>) -> Result<String> {
    let table = read_table(path)?;
    render::to_json_default(&table)
}

/// Convert an in-memory workbook to compact JSON.
pub fn convert_bytes(data: &[u8]) -> Result<String> {
    let table = read_table_from_bytes(data.to_vec())?;
    render::to_json_default(&table)
}

/// Convert a workbook file to JSON in the given format.
pub fn convert_with_format(path: impl AsRef<Path>, format: render::JsonFormat) -> Result<String> {
    let table = read_table(path)?;
    render::to_json(&table, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = convert("definitely/not/here.xlsx");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_not_a_workbook() {
        let result = convert_bytes(b"name,age\nzhang,12\n");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
