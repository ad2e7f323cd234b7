//! Sparse in-memory worksheet.

use super::CellValue;
use std::collections::BTreeMap;

/// The cells of one worksheet, keyed by zero-based position.
///
/// Only non-empty cells are stored. Each stored row is dense from column A
/// up to its last value, so leading empty columns keep their position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    /// Sheet name
    pub name: String,
    rows: BTreeMap<u32, Vec<CellValue>>,
}

impl Grid {
    /// Create an empty grid for the named sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Store a value at (row, col). Empty values are ignored.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            return;
        }
        let cells = self.rows.entry(row).or_default();
        let col = col as usize;
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }

    /// Value at (row, col), `Empty` when unset.
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(&row)
            .and_then(|cells| cells.get(col as usize))
            .unwrap_or(EMPTY)
    }

    /// Rows holding at least one value, in sheet order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &[CellValue])> {
        self.rows
            .iter()
            .map(|(idx, cells)| (*idx, cells.as_slice()))
    }

    /// Number of rows holding at least one value.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns from A through the rightmost value of any row.
    pub fn width(&self) -> usize {
        self.rows.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether the sheet has no values at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
