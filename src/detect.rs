//! Format detection for spreadsheet files.

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE2 compound file magic, used by legacy BIFF8 workbooks (.xls).
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Content type for a regular XLSX workbook part.
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for an XLTX template workbook part.
const XLTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml";

/// Content type for a macro-enabled workbook part (.xlsm).
const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Content type for the binary workbook part (.xlsb).
const XLSB_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.binary.macroEnabled.main";

/// Detected spreadsheet format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Excel workbook or template (.xlsx, .xltx)
    Xlsx,
    /// Macro-enabled Excel workbook (.xlsm)
    Xlsm,
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Xlsx => "xlsx",
            FormatType::Xlsm => "xlsm",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Xlsx => "Excel Workbook",
            FormatType::Xlsm => "Excel Macro-Enabled Workbook",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the format type from a file path.
///
/// # Example
///
/// ```no_run
/// use sheetjson::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("zongce.xlsx")?;
/// println!("Detected format: {}", format);
/// # Ok::<(), sheetjson::Error>(())
/// ```
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    let read = reader.read(&mut magic)?;
    check_magic(&magic[..read])?;
    reader.rewind()?;

    detect_format_from_reader(reader)
}

/// Detect the format type from a byte slice.
///
/// # Example
///
/// ```no_run
/// use sheetjson::detect::detect_format_from_bytes;
///
/// let data = std::fs::read("zongce.xlsx")?;
/// let format = detect_format_from_bytes(&data)?;
/// # Ok::<(), sheetjson::Error>(())
/// ```
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    check_magic(data)?;
    let cursor = std::io::Cursor::new(data);
    detect_format_from_reader(cursor)
}

fn check_magic(data: &[u8]) -> Result<()> {
    if data.len() >= CFB_MAGIC.len() && data[..CFB_MAGIC.len()] == CFB_MAGIC {
        return Err(Error::UnsupportedFormat(
            "legacy .xls (OLE2 compound file)".to_string(),
        ));
    }
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    Ok(())
}

/// Detect the format type from a reader over a ZIP package.
pub fn detect_format_from_reader<R: Read + Seek>(reader: R) -> Result<FormatType> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let content_types = match archive.by_name("[Content_Types].xml") {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            decode_xml_bytes(&bytes)?
        }
        Err(_) => {
            return Err(Error::MissingComponent("[Content_Types].xml".to_string()));
        }
    };

    if content_types.contains(XLSX_CONTENT_TYPE) || content_types.contains(XLTX_CONTENT_TYPE) {
        Ok(FormatType::Xlsx)
    } else if content_types.contains(XLSM_CONTENT_TYPE) {
        Ok(FormatType::Xlsm)
    } else if content_types.contains(XLSB_CONTENT_TYPE) {
        Err(Error::UnsupportedFormat("binary workbook (.xlsb)".to_string()))
    } else {
        detect_by_folder_structure(&mut archive)
    }
}

/// Fallback detection by checking folder structure.
fn detect_by_folder_structure<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<FormatType> {
    let has_workbook = archive.file_names().any(|n| n == "xl/workbook.xml");
    let has_word = archive.file_names().any(|n| n.starts_with("word/"));
    let has_ppt = archive.file_names().any(|n| n.starts_with("ppt/"));

    match (has_workbook, has_word, has_ppt) {
        (true, false, false) => Ok(FormatType::Xlsx),
        (false, true, _) => Err(Error::UnsupportedFormat("Word document".to_string())),
        (false, _, true) => Err(Error::UnsupportedFormat(
            "PowerPoint presentation".to_string(),
        )),
        _ => Err(Error::UnknownFormat),
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}
