//! JSON renderer implementation.

use crate::error::Result;
use crate::model::Table;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    #[default]
    Compact,
    /// Pretty-printed with 2-space indentation
    Pretty,
}

/// Convert a table to a JSON array of records.
///
/// Object keys follow header order and non-ASCII text is written as UTF-8,
/// never as `\u` escapes.
pub fn to_json(table: &Table, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(table)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(table)?,
    };
    Ok(json)
}

/// Convert a table to compact JSON.
pub fn to_json_default(table: &Table) -> Result<String> {
    to_json(table, JsonFormat::Compact)
}
