use std::io::{Cursor, Read};

use crate::error::Error;

const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL_SUFFIX: &str = "/officeDocument";

/// Read-only view over the entries of a DOCX package.
pub(crate) struct Archive<'a> {
    zip: zip::ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Archive<'a> {
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self, Error> {
        let zip = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::PackageCorrupt(format!("file is not a ZIP archive ({e})")))?;
        Ok(Self { zip })
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.zip.file_names().any(|n| n == name)
    }

    pub(crate) fn read_bytes(&mut self, name: &str) -> Option<Vec<u8>> {
        let mut entry = self.zip.by_name(name).ok()?;
        let mut data = Vec::new();
        if let Err(e) = entry.read_to_end(&mut data) {
            log::debug!("Unreadable entry {name}: {e}");
            return None;
        }
        Some(data)
    }

    pub(crate) fn read_text(&mut self, name: &str) -> Option<String> {
        let data = self.read_bytes(name)?;
        let mut text = match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => {
                log::debug!("Entry {name} is not UTF-8: {e}");
                return None;
            }
        };
        if text.starts_with('\u{feff}') {
            text.remove(0);
        }
        Some(text)
    }

    /// Locate the main document part through the package-level `_rels/.rels`.
    pub(crate) fn main_part(&mut self) -> String {
        let Some(xml_content) = self.read_text("_rels/.rels") else {
            return DEFAULT_MAIN_PART.to_string();
        };
        let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
            log::warn!("Malformed _rels/.rels, assuming {DEFAULT_MAIN_PART}");
            return DEFAULT_MAIN_PART.to_string();
        };
        xml.root_element()
            .children()
            .filter(|n| n.tag_name().name() == "Relationship")
            .find(|n| {
                n.attribute("Type")
                    .is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL_SUFFIX))
            })
            .and_then(|n| n.attribute("Target"))
            .map(|target| resolve_target("", target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
    }
}

/// Manifest path for a part: "word/document.xml" → "word/_rels/document.xml.rels".
pub(crate) fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    match source_part.rsplit_once('/') {
        Some((dir, _)) => normalize(&format!("{dir}/{target}")),
        None => normalize(target),
    }
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
