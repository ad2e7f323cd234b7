//! ZIP container abstraction for OOXML spreadsheet packages.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// A relationship entry from a .rels file.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Collection of relationships parsed from a .rels file.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
    /// Map from relationship type to list of relationships
    pub by_type: HashMap<String, Vec<Relationship>>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Find the first relationship whose type URI ends with `/{kind}`.
    ///
    /// Transitional and strict OOXML use different namespace prefixes for
    /// the same relationship kinds, so matching on the last segment covers both.
    pub fn find_kind(&self, kind: &str) -> Option<&Relationship> {
        let suffix = format!("/{}", kind);
        self.by_type
            .iter()
            .find(|(rel_type, _)| rel_type.ends_with(&suffix))
            .and_then(|(_, rels)| rels.first())
    }

    /// Add a relationship.
    pub fn add(&mut self, rel: Relationship) {
        self.by_type
            .entry(rel.rel_type.clone())
            .or_default()
            .push(rel.clone());
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// After decoding UTF-16 XML into a Rust String the declaration still says
/// encoding="UTF-16", which quick-xml would honour when re-reading it.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
///
/// Spreadsheet packages are almost always UTF-8, but some producers write
/// UTF-16 parts.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    // UTF-8 BOM: EF BB BF
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    // UTF-16 LE BOM: FF FE
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let content = decode_utf16_le(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    // UTF-16 BE BOM: FE FF
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let content = decode_utf16_be(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // ASCII in UTF-16 LE has zero high bytes at odd offsets
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16_le(bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16_be(bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn decode_utf16_le(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;

    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_le_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn decode_utf16_be(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;

    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_be_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// OOXML container abstraction over a ZIP archive.
///
/// The whole package is read into memory once; parts are then decompressed
/// on demand.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open an OOXML container from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sheetjson::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("zongce.xlsx")?;
    /// # Ok::<(), sheetjson::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let cursor = Cursor::new(data);
        let archive = zip::ZipArchive::new(cursor)?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Read an XML part from the archive as a string.
    ///
    /// Handles UTF-8 (with or without BOM) and UTF-16 LE/BE.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        decode_xml_bytes(&bytes)
    }

    /// Read an XML part if present, `None` if the package does not contain it.
    pub fn read_optional_xml(&self, path: &str) -> Result<Option<String>> {
        if !self.exists(path) {
            return Ok(None);
        }
        self.read_xml(path).map(Some)
    }

    /// Check if a file exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all files in the archive.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }

    /// Read and parse the relationships of a part (`dir/_rels/name.rels`).
    ///
    /// A part without a .rels file has no relationships.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = if part_path.is_empty() || part_path == "/" {
            "_rels/.rels".to_string()
        } else {
            match part_path.rsplit_once('/') {
                Some((parent, filename)) => format!("{}/_rels/{}.rels", parent, filename),
                None => format!("_rels/{}.rels", part_path),
            }
        };

        self.parse_relationships(&rels_path)
    }

    /// Read package-level relationships (_rels/.rels).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.parse_relationships("_rels/.rels")
    }

    fn parse_relationships(&self, rels_path: &str) -> Result<Relationships> {
        let content = match self.read_optional_xml(rels_path)? {
            Some(c) => c,
            None => return Ok(Relationships::new()),
        };

        if content.trim().is_empty() {
            return Ok(Relationships::new());
        }

        let mut rels = Relationships::new();
        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Type" => rel_type = value,
                            b"Target" => target = value,
                            b"TargetMode" => external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }

                    if !id.is_empty() {
                        rels.add(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Resolve a relationship target against the part that owns it.
    ///
    /// Absolute targets (leading `/`) are package-rooted.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut parts: Vec<&str> = match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
            None => Vec::new(),
        };

        for component in relative.split(['/', '\\']) {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                c => parts.push(c),
            }
        }

        parts.join("/")
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.list_files().len())
            .finish()
    }
}
