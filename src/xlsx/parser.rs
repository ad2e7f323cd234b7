//! XLSX parser implementation.

use crate::container::OoxmlContainer;
use crate::error::{Error, Result};
use crate::model::{CellValue, Grid};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

use super::reference::{parse_reference, MAX_COLUMNS, MAX_ROWS};
use super::shared_strings::SharedStrings;
use super::styles::{NumberKind, Styles};
use super::workbook::{SheetInfo, Workbook};

/// Parser for XLSX (Excel) workbooks.
pub struct XlsxParser {
    container: OoxmlContainer,
    workbook: Workbook,
    shared_strings: SharedStrings,
    styles: Styles,
}

/// Attributes of the `<c>` element currently being read.
#[derive(Debug, Default)]
struct PendingCell {
    row: u32,
    col: u32,
    cell_type: Option<String>,
    style: Option<usize>,
    value: String,
}

impl XlsxParser {
    /// Open an XLSX file for parsing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = OoxmlContainer::open(path)?;
        Self::from_container(container)
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        Self::from_container(container)
    }

    /// Create a parser from a container.
    ///
    /// Reads the workbook part, the shared string table and the styles up
    /// front; worksheets are read on demand.
    fn from_container(container: OoxmlContainer) -> Result<Self> {
        let workbook = Workbook::load(&container)?;

        let shared_strings = match &workbook.shared_strings_path {
            Some(path) => match container.read_optional_xml(path)? {
                Some(xml) => SharedStrings::parse(&xml)?,
                None => SharedStrings::default(),
            },
            None => SharedStrings::default(),
        };

        let styles = match &workbook.styles_path {
            Some(path) => match container.read_optional_xml(path)? {
                Some(xml) => Styles::parse(&xml),
                None => Styles::default(),
            },
            None => Styles::default(),
        };

        tracing::debug!(
            workbook = %workbook.path,
            sheets = workbook.sheets.len(),
            shared_strings = shared_strings.len(),
            date1904 = workbook.date1904,
            "opened workbook"
        );

        Ok(Self {
            container,
            workbook,
            shared_strings,
            styles,
        })
    }

    /// Read the default (first) sheet into a grid.
    pub fn first_sheet(&self) -> Result<Grid> {
        let sheet = self.workbook.first_sheet()?;
        self.read_sheet(sheet)
    }

    /// Read the sheet at `index` (workbook order) into a grid.
    pub fn sheet(&self, index: usize) -> Result<Grid> {
        let sheet = self.workbook.sheets.get(index).ok_or_else(|| {
            Error::InvalidData(format!(
                "sheet index {} out of range ({} sheets)",
                index,
                self.workbook.sheets.len()
            ))
        })?;
        self.read_sheet(sheet)
    }

    fn read_sheet(&self, sheet: &SheetInfo) -> Result<Grid> {
        let path = sheet.path.as_deref().ok_or_else(|| {
            Error::MissingComponent(format!(
                "worksheet relationship '{}' for sheet '{}'",
                sheet.rel_id, sheet.name
            ))
        })?;

        tracing::debug!(sheet = %sheet.name, part = %path, "reading worksheet");
        let xml = self.container.read_xml(path)?;
        self.parse_sheet(&sheet.name, &xml)
    }

    /// Parse a worksheet XML into a grid.
    fn parse_sheet(&self, name: &str, xml: &str) -> Result<Grid> {
        let mut grid = Grid::new(name);
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut buf = Vec::new();
        // Row and column cursors, so cells without an `r` attribute still land
        // next to their predecessor
        let mut next_row: u32 = 0;
        let mut next_col: u32 = 0;
        let mut current_row: u32 = 0;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline = false;
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"row" => {
                        current_row = row_index(e, next_row)?;
                        next_row = advance(current_row, "row")?;
                        next_col = 0;
                    }
                    b"c" => {
                        let pending = self.start_cell(e, current_row, next_col)?;
                        next_col = advance(pending.col, "column")?;
                        cell = Some(pending);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"is" if cell.is_some() => in_inline = true,
                    b"rPh" => phonetic_depth += 1,
                    b"t" if in_inline && phonetic_depth == 0 => in_value = true,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"row" => {
                        current_row = row_index(e, next_row)?;
                        next_row = advance(current_row, "row")?;
                        next_col = 0;
                    }
                    b"c" => {
                        // A cell with no value only carries formatting
                        let pending = self.start_cell(e, current_row, next_col)?;
                        next_col = advance(pending.col, "column")?;
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Text(ref e)) => {
                    if in_value {
                        if let Some(pending) = cell.as_mut() {
                            pending.value.push_str(&e.unescape()?);
                        }
                    }
                }
                Ok(quick_xml::events::Event::CData(ref e)) => {
                    if in_value {
                        if let Some(pending) = cell.as_mut() {
                            pending.value.push_str(&String::from_utf8_lossy(e));
                        }
                    }
                }
                Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            let value = self.resolve_cell_value(&pending)?;
                            grid.set(pending.row, pending.col, value);
                        }
                        in_value = false;
                        in_inline = false;
                    }
                    b"v" | b"t" => in_value = false,
                    b"is" => in_inline = false,
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        tracing::debug!(
            sheet = %name,
            rows = grid.row_count(),
            columns = grid.width(),
            "parsed worksheet"
        );

        Ok(grid)
    }

    fn start_cell(
        &self,
        e: &quick_xml::events::BytesStart<'_>,
        row: u32,
        col: u32,
    ) -> Result<PendingCell> {
        let mut pending = PendingCell {
            row,
            col,
            ..Default::default()
        };

        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"r" => {
                    let reference = String::from_utf8_lossy(&attr.value);
                    let (r, c) = parse_reference(&reference).ok_or_else(|| {
                        Error::InvalidData(format!("bad cell reference '{}'", reference))
                    })?;
                    pending.row = r;
                    pending.col = c;
                }
                b"t" => {
                    pending.cell_type = Some(String::from_utf8_lossy(&attr.value).to_string());
                }
                b"s" => {
                    pending.style = String::from_utf8_lossy(&attr.value).parse().ok();
                }
                _ => {}
            }
        }

        if pending.col >= MAX_COLUMNS {
            return Err(Error::InvalidData(format!(
                "column {} in row {} exceeds the sheet limit of {} columns",
                u64::from(pending.col) + 1,
                u64::from(pending.row) + 1,
                MAX_COLUMNS
            )));
        }

        Ok(pending)
    }

    /// Resolve a cell value based on its type and number format.
    fn resolve_cell_value(&self, cell: &PendingCell) -> Result<CellValue> {
        let value = cell.value.as_str();
        if value.is_empty() {
            return Ok(CellValue::Empty);
        }

        match cell.cell_type.as_deref() {
            Some("s") => {
                let text = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| self.shared_strings.get(idx))
                    .ok_or_else(|| {
                        Error::InvalidData(format!(
                            "shared string index '{}' at row {} column {}",
                            value,
                            cell.row + 1,
                            cell.col + 1
                        ))
                    })?;
                Ok(CellValue::Text(text.to_string()))
            }
            Some("b") => match value.trim() {
                "1" | "true" | "TRUE" => Ok(CellValue::Bool(true)),
                "0" | "false" | "FALSE" => Ok(CellValue::Bool(false)),
                other => Err(Error::InvalidData(format!("boolean cell value '{}'", other))),
            },
            Some("e") => Ok(CellValue::Error(value.to_string())),
            Some("str") | Some("inlineStr") => Ok(CellValue::Text(value.to_string())),
            Some("d") => Ok(parse_iso_datetime(value)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(value.to_string()))),
            _ => {
                let number: f64 = value.trim().parse().map_err(|_| {
                    Error::InvalidData(format!(
                        "numeric cell value '{}' at row {} column {}",
                        value,
                        cell.row + 1,
                        cell.col + 1
                    ))
                })?;
                Ok(self.typed_number(number, cell.style))
            }
        }
    }

    /// Apply the cell's number format to a raw number.
    fn typed_number(&self, number: f64, style: Option<usize>) -> CellValue {
        let kind = style
            .map(|s| self.styles.number_kind(s))
            .unwrap_or(NumberKind::Number);

        let date1904 = self.workbook.date1904;
        let typed = match kind {
            NumberKind::Number => None,
            NumberKind::Time if number < 1.0 => {
                Styles::serial_to_time(number).map(CellValue::Time)
            }
            NumberKind::Time | NumberKind::DateTime => {
                Styles::serial_to_datetime(number, date1904).map(CellValue::DateTime)
            }
        };

        typed.unwrap_or(CellValue::Number(number))
    }

    /// Get a reference to the container.
    pub fn container(&self) -> &OoxmlContainer {
        &self.container
    }

    /// Whether the workbook uses the 1904 date system.
    pub fn date1904(&self) -> bool {
        self.workbook.date1904
    }

    /// Get the number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.workbook.sheets.len()
    }

    /// Get sheet names.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Zero-based index of a `<row>` element: its `r` attribute, or the
/// cursor position when the attribute is absent.
fn row_index(e: &quick_xml::events::BytesStart<'_>, cursor: u32) -> Result<u32> {
    let row = row_attr(e)?.unwrap_or(cursor);
    if row >= MAX_ROWS {
        return Err(Error::InvalidData(format!(
            "row {} exceeds the sheet limit of {} rows",
            u64::from(row) + 1,
            MAX_ROWS
        )));
    }
    Ok(row)
}

/// Read the `r` attribute of a `<row>` element as a zero-based index.
fn row_attr(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<u32>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"r" {
            let text = String::from_utf8_lossy(&attr.value);
            let row: u32 = text
                .trim()
                .parse()
                .map_err(|_| Error::InvalidData(format!("bad row number '{}'", text)))?;
            if row == 0 || row > MAX_ROWS {
                return Err(Error::InvalidData(format!("row number {} out of range", row)));
            }
            return Ok(Some(row - 1));
        }
    }
    Ok(None)
}

/// Step a row or column cursor past `index`.
fn advance(index: u32, what: &str) -> Result<u32> {
    index
        .checked_add(1)
        .ok_or_else(|| Error::InvalidData(format!("{} index overflow", what)))
}

/// Parse the ISO-8601 text of a `t="d"` cell.
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
