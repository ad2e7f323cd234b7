//! In-memory XLSX fixtures for integration tests.
//!
//! Builds real workbook packages with `zip::ZipWriter` so tests do not depend
//! on binary files checked into the repository.

#![allow(dead_code)]

use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A fixture cell.
#[derive(Debug, Clone)]
pub enum Cell {
    /// Shared string
    Text(&'static str),
    /// Inline string
    Inline(&'static str),
    /// Plain number
    Num(f64),
    /// Serial number under a `yyyy-mm-dd` format
    Date(f64),
    /// Boolean
    Bool(bool),
    /// Error code
    Err(&'static str),
    /// No cell element at all
    Blank,
}

/// One worksheet of a fixture workbook.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    /// Rows as (1-based row number, cells from column A)
    pub rows: Vec<(u32, Vec<Cell>)>,
}

impl Sheet {
    /// A sheet whose rows start at row 1 with no gaps.
    pub fn dense(name: &'static str, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name,
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, cells)| (i as u32 + 1, cells))
                .collect(),
        }
    }
}

/// A workbook tab: a worksheet, or a chart sheet with no cells.
#[derive(Debug, Clone)]
enum Tab {
    Work(Sheet),
    Chart(&'static str),
}

impl Tab {
    fn name(&self) -> &'static str {
        match self {
            Tab::Work(sheet) => sheet.name,
            Tab::Chart(name) => name,
        }
    }
}

/// Workbook fixture builder.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    tabs: Vec<Tab>,
    date1904: bool,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, sheet: Sheet) -> Self {
        self.tabs.push(Tab::Work(sheet));
        self
    }

    pub fn chart_sheet(mut self, name: &'static str) -> Self {
        self.tabs.push(Tab::Chart(name));
        self
    }

    pub fn date1904(mut self, yes: bool) -> Self {
        self.date1904 = yes;
        self
    }

    /// Serialize to .xlsx bytes.
    ///
    /// Sheet part names are numbered in reverse workbook order, so the
    /// first sheet is never simply `sheet1.xml`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut shared: Vec<&'static str> = Vec::new();
        let count = self.tabs.len();

        let mut worksheets = Vec::new();
        for (idx, tab) in self.tabs.iter().enumerate() {
            let number = count - idx;
            worksheets.push(match tab {
                Tab::Work(sheet) => SheetPart {
                    path: format!("worksheets/sheet{}.xml", number),
                    kind: "worksheet",
                    xml: sheet_xml(sheet, &mut shared),
                },
                Tab::Chart(_) => SheetPart {
                    path: format!("chartsheets/sheet{}.xml", number),
                    kind: "chartsheet",
                    xml: CHARTSHEET.to_string(),
                },
            });
        }

        let mut parts: Vec<(String, String)> = Vec::new();
        parts.push(("[Content_Types].xml".to_string(), content_types(&worksheets)));
        parts.push(("_rels/.rels".to_string(), PACKAGE_RELS.to_string()));
        parts.push(("xl/workbook.xml".to_string(), self.workbook_xml()));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            workbook_rels(&worksheets),
        ));
        parts.push(("xl/styles.xml".to_string(), STYLES.to_string()));
        parts.push(("xl/sharedStrings.xml".to_string(), shared_strings(&shared)));
        for part in &worksheets {
            parts.push((format!("xl/{}", part.path), part.xml.clone()));
        }

        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (name, data) in &parts {
                zip.start_file(name.as_str(), options).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    /// Write the workbook into `dir` under `name`.
    pub fn write_to(&self, dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        if self.date1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        xml.push_str("<sheets>");
        for (idx, tab) in self.tabs.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(tab.name()),
                idx + 1,
                idx + 10
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }
}

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts>
  <cellXfs count="2"><xf numFmtId="0" fontId="0"/><xf numFmtId="164" fontId="0" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

/// A sheet part: path below `xl/`, relationship kind and XML.
#[derive(Debug, Clone)]
struct SheetPart {
    path: String,
    kind: &'static str,
    xml: String,
}

const CHARTSHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<chartsheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetViews><sheetView workbookViewId="0"/></sheetViews></chartsheet>"#;

fn content_types(worksheets: &[SheetPart]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for part in worksheets {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.{}+xml"/>"#,
            part.path, part.kind
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn workbook_rels(worksheets: &[SheetPart]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
    );
    for (idx, part) in worksheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
            idx + 10,
            part.kind,
            part.path
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn shared_strings(strings: &[&str]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!("<si><t>{}</t></si>", escape(*s)));
    }
    xml.push_str("</sst>");
    xml
}

fn sheet_xml(sheet: &Sheet, shared: &mut Vec<&'static str>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row, cells) in &sheet.rows {
        xml.push_str(&format!(r#"<row r="{}">"#, row));
        for (col, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_letters(col), row);
            let element = match cell {
                Cell::Text(s) => {
                    let idx = match shared.iter().position(|x| x == s) {
                        Some(idx) => idx,
                        None => {
                            shared.push(*s);
                            shared.len() - 1
                        }
                    };
                    format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, idx)
                }
                Cell::Inline(s) => format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference,
                    escape(*s)
                ),
                Cell::Num(n) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n),
                Cell::Date(n) => format!(r#"<c r="{}" s="1"><v>{}</v></c>"#, reference, n),
                Cell::Bool(b) => format!(
                    r#"<c r="{}" t="b"><v>{}</v></c>"#,
                    reference,
                    if *b { 1 } else { 0 }
                ),
                Cell::Err(code) => format!(r#"<c r="{}" t="e"><v>{}</v></c>"#, reference, code),
                Cell::Blank => String::new(),
            };
            xml.push_str(&element);
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}
