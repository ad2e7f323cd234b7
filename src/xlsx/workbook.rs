//! Workbook part: sheet list, sheet locations and workbook properties.

use crate::container::OoxmlContainer;
use crate::error::{Error, Result};

/// Default location of the workbook part when the package relationships
/// do not name one.
const DEFAULT_WORKBOOK_PATH: &str = "xl/workbook.xml";

/// Sheet info from workbook.xml.
#[derive(Debug, Clone)]
pub struct SheetInfo {
    /// Display name
    pub name: String,
    /// Relationship id pointing at the worksheet part
    pub rel_id: String,
    /// Package path of the sheet part, if its relationship resolved
    pub path: Option<String>,
    /// Relationship type of the sheet part, if its relationship resolved
    pub rel_type: Option<String>,
}

impl SheetInfo {
    /// Whether the sheet holds cells. Chart sheets and dialog sheets do not.
    ///
    /// A sheet whose relationship is missing counts as a worksheet, so that
    /// reading it reports the broken relationship.
    pub fn is_worksheet(&self) -> bool {
        self.rel_type
            .as_deref()
            .map_or(true, |kind| kind.ends_with("/worksheet"))
    }
}

/// Parsed workbook.xml plus the part locations it refers to.
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Package path of workbook.xml
    pub path: String,
    /// Sheets in workbook order
    pub sheets: Vec<SheetInfo>,
    /// Whether serial dates count from 1904-01-01
    pub date1904: bool,
    /// Package path of the shared strings part
    pub shared_strings_path: Option<String>,
    /// Package path of the styles part
    pub styles_path: Option<String>,
}

impl Workbook {
    /// Locate and parse the workbook part of a container.
    pub fn load(container: &OoxmlContainer) -> Result<Self> {
        let package_rels = container.read_package_relationships()?;
        let path = package_rels
            .find_kind("officeDocument")
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PATH.to_string());

        let xml = container.read_xml(&path)?;
        let (mut sheets, date1904) = parse_workbook_xml(&xml)?;

        let rels = container.read_relationships(&path)?;
        for sheet in &mut sheets {
            if let Some(rel) = rels.get(&sheet.rel_id).filter(|rel| !rel.external) {
                sheet.path = Some(OoxmlContainer::resolve_path(&path, &rel.target));
                sheet.rel_type = Some(rel.rel_type.clone());
            }
        }

        let shared_strings_path = rels
            .find_kind("sharedStrings")
            .map(|rel| OoxmlContainer::resolve_path(&path, &rel.target))
            .or_else(|| existing(container, "xl/sharedStrings.xml"));
        let styles_path = rels
            .find_kind("styles")
            .map(|rel| OoxmlContainer::resolve_path(&path, &rel.target))
            .or_else(|| existing(container, "xl/styles.xml"));

        Ok(Self {
            path,
            sheets,
            date1904,
            shared_strings_path,
            styles_path,
        })
    }

    /// The default sheet: the first worksheet in workbook order.
    pub fn first_sheet(&self) -> Result<&SheetInfo> {
        self.sheets
            .iter()
            .find(|sheet| sheet.is_worksheet())
            .ok_or(Error::NoSheets)
    }
}

fn existing(container: &OoxmlContainer, path: &str) -> Option<String> {
    container.exists(path).then(|| path.to_string())
}

/// Parse workbook.xml for the sheet list and the date system.
fn parse_workbook_xml(xml: &str) -> Result<(Vec<SheetInfo>, bool)> {
    let mut sheets = Vec::new();
    let mut date1904 = false;

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e)) => {
                match e.local_name().as_ref() {
                    b"sheet" => {
                        let mut name = String::new();
                        let mut rel_id = String::new();

                        for attr in e.attributes().flatten() {
                            let key = attr.key;
                            if key.as_ref() == b"name" {
                                name = attr.unescape_value()?.into_owned();
                            } else if key.local_name().as_ref() == b"id"
                                && key.prefix().is_some()
                            {
                                rel_id = String::from_utf8_lossy(&attr.value).to_string();
                            }
                        }

                        if !name.is_empty() {
                            sheets.push(SheetInfo {
                                name,
                                rel_id,
                                path: None,
                                rel_type: None,
                            });
                        }
                    }
                    b"workbookPr" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"date1904" {
                                let value = String::from_utf8_lossy(&attr.value);
                                date1904 = value == "1" || value.eq_ignore_ascii_case("true");
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date1904))
}
