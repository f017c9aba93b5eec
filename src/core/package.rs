// src/core/package.rs
//
// In-memory .docx package. Entries are read once into an ordered list so the
// rewritten archive keeps the original layout; the main document part and
// every header/footer part are parsed into owned trees for mutation.

use std::io::{Cursor, Read, Write};

use anyhow::{anyhow, Context, Result};
use log::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::xml::{self, XmlElement};

pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
    document: XmlElement,
    /// Header/footer trees, keyed by entry name.
    extra_parts: Vec<(String, XmlElement)>,
}

impl DocxPackage {
    /// Open template bytes as an editable package. The caller's bytes are
    /// copied; the source is never mutated.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).context("template is not a readable zip package")?;

        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if name.ends_with('/') {
                continue;
            }
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("failed to read package entry '{name}'"))?;
            entries.push((name, data));
        }

        let doc_bytes = entries
            .iter()
            .find(|(name, _)| name == DOCUMENT_PART)
            .map(|(_, data)| data)
            .ok_or_else(|| anyhow!("package has no {DOCUMENT_PART} part"))?;
        let doc_xml =
            std::str::from_utf8(doc_bytes).context("word/document.xml is not valid UTF-8")?;
        let document = xml::parse_part(doc_xml)
            .with_context(|| format!("failed to parse {DOCUMENT_PART}"))?;

        let mut extra_parts = Vec::new();
        for (name, data) in &entries {
            if !is_header_or_footer(name) {
                continue;
            }
            let part_xml =
                std::str::from_utf8(data).with_context(|| format!("'{name}' is not valid UTF-8"))?;
            let tree =
                xml::parse_part(part_xml).with_context(|| format!("failed to parse '{name}'"))?;
            extra_parts.push((name.clone(), tree));
        }
        debug!(
            "opened package: {} entries, {} header/footer parts",
            entries.len(),
            extra_parts.len()
        );

        Ok(Self {
            entries,
            document,
            extra_parts,
        })
    }

    /// The `w:body` of the main document part.
    pub fn body_mut(&mut self) -> Result<&mut XmlElement> {
        self.document
            .first_child_mut("body")
            .ok_or_else(|| anyhow!("document has no body"))
    }

    /// Roots of every part that can hold content controls: the main document
    /// followed by each header and footer.
    pub fn part_roots_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        std::iter::once(&mut self.document).chain(self.extra_parts.iter_mut().map(|(_, el)| el))
    }

    /// Serialize every parsed part over its entry and repackage the zip.
    pub fn save(mut self) -> Result<Vec<u8>> {
        let doc_bytes = xml::write_part(&self.document)?;
        set_entry(&mut self.entries, DOCUMENT_PART, doc_bytes);
        for (name, tree) in &self.extra_parts {
            let bytes =
                xml::write_part(tree).with_context(|| format!("failed to serialize '{name}'"))?;
            set_entry(&mut self.entries, name, bytes);
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);
        // Media entries stay uncompressed, matching the layout Word produces.
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in &self.entries {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        let cursor = writer.finish().context("failed to finish output package")?;
        Ok(cursor.into_inner())
    }
}

fn is_header_or_footer(name: &str) -> bool {
    (name.starts_with("word/header") || name.starts_with("word/footer")) && name.ends_with(".xml")
}

fn set_entry(entries: &mut Vec<(String, Vec<u8>)>, name: &str, data: Vec<u8>) {
    if let Some(slot) = entries.iter_mut().find(|(n, _)| n == name) {
        slot.1 = data;
    } else {
        entries.push((name.to_string(), data));
    }
}
