//! In-memory spreadsheet model.
//!
//! Parsers turn worksheet XML into a [`Grid`] of typed [`CellValue`]s; a
//! [`Table`] then splits the grid into headers and data rows, and renderers
//! serialize the table as header-keyed [`Record`]s.

mod cell;
mod grid;
mod table;

pub use cell::*;
pub use grid::*;
pub use table::*;
