//! Header-keyed records derived from a worksheet.

use super::{CellValue, Grid};
use crate::error::{Error, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// A sheet split into a header row and data rows.
///
/// Every row holds exactly `headers.len()` values, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Unique column names, in column order
    pub headers: Vec<String>,
    /// Data rows, in sheet order
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table from a grid.
    ///
    /// The first non-blank row is the header row; every later non-blank row
    /// is a data row. A grid without any values has no header and fails with
    /// [`Error::EmptySheet`]. A header-only grid yields a table with no rows.
    pub fn from_grid(grid: &Grid) -> Result<Self> {
        let width = grid.width();
        let mut rows = grid.rows();

        let header_cells = match rows.next() {
            Some((_, cells)) => cells,
            None => return Err(Error::EmptySheet(grid.name.clone())),
        };

        let headers = header_names((0..width).map(|i| header_cells.get(i)));

        let rows = rows
            .map(|(_, cells)| {
                let mut row = cells.to_vec();
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Build a table from explicit headers and rows.
    ///
    /// Rows are padded or truncated to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the data rows as header-keyed records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            headers: &self.headers,
            values,
        })
    }

    /// Value of `column` in data row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// One data row viewed as an ordered header → value mapping.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    values: &'a [CellValue],
}

impl<'a> Record<'a> {
    /// Value for a header.
    pub fn get(&self, header: &str) -> Option<&'a CellValue> {
        let idx = self.headers.iter().position(|h| h == header)?;
        self.values.get(idx)
    }

    /// (header, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (header, value) in self.iter() {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// Turn header cells into unique column names.
///
/// Empty cells become `Unnamed: {index}`. Repeated names get `.1`, `.2`, …
/// appended, skipping any suffix that would collide with a name already used.
fn header_names<'a>(cells: impl Iterator<Item = Option<&'a CellValue>>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (idx, cell) in cells.enumerate() {
        let mut name = cell
            .and_then(CellValue::to_header)
            .unwrap_or_else(|| format!("Unnamed: {}", idx));

        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), count + 1);
        names.push(name);
    }

    names
}
