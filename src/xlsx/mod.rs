//! XLSX (Excel) workbook reader.
//!
//! This module reads Office Open XML workbooks (.xlsx, .xlsm) into typed
//! cell grids. Only the parts needed for cell values are read: the
//! workbook, its relationships, the shared string table, the number formats
//! in the stylesheet and the worksheets themselves.
//!
//! # Example
//!
//! ```no_run
//! use sheetjson::xlsx::XlsxParser;
//!
//! let parser = XlsxParser::open("zongce.xlsx")?;
//! println!("Sheets: {:?}", parser.sheet_names());
//!
//! let grid = parser.first_sheet()?;
//! println!("{} rows", grid.row_count());
//! # Ok::<(), sheetjson::Error>(())
//! ```

mod parser;
mod reference;
mod shared_strings;
mod styles;
mod workbook;

pub use parser::XlsxParser;
pub use reference::{column_index, parse_reference, MAX_COLUMNS, MAX_ROWS};
pub use styles::{NumberKind, Styles};
