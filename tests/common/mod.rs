// Shared fixtures: synthesize minimal .docx packages in memory and re-parse
// produced output with roxmltree for assertions.

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Wrap body content into a complete `word/document.xml` part.
pub fn document_xml(body_inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body_inner}</w:body></w:document>"#
    )
}

/// Build a docx package holding `word/document.xml` plus extra parts.
pub fn build_docx(document: &str, extras: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer
        .write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    for (name, data) in extras {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// An inline content control with a `w:tag`.
pub fn control(tag: &str, text: &str) -> String {
    format!(
        r#"<w:sdt><w:sdtPr><w:tag w:val="{tag}"/></w:sdtPr><w:sdtContent><w:r><w:t>{text}</w:t></w:r></w:sdtContent></w:sdt>"#
    )
}

pub fn cell(inner: &str) -> String {
    format!("<w:tc><w:p>{inner}</w:p></w:tc>")
}

pub fn plain_cell(text: &str) -> String {
    cell(&format!("<w:r><w:t>{text}</w:t></w:r>"))
}

pub fn row(cells: &[String]) -> String {
    format!("<w:tr>{}</w:tr>", cells.concat())
}

/// Extract a part from a produced package.
pub fn read_part(package: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut xml = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

/// Concatenated text of every row of the first table of the document part,
/// one string per row.
pub fn table_row_texts(package: &[u8]) -> Vec<String> {
    let xml = read_part(package, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let tbl = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "tbl")
        .expect("output has no table");
    tbl.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "tr")
        .map(|tr| {
            tr.descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == "t")
                .filter_map(|t| t.text())
                .collect::<String>()
        })
        .collect()
}

/// Per-cell text of every row of the first table.
pub fn table_cell_texts(package: &[u8]) -> Vec<Vec<String>> {
    let xml = read_part(package, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let tbl = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "tbl")
        .expect("output has no table");
    tbl.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "tr")
        .map(|tr| {
            tr.children()
                .filter(|n| n.is_element() && n.tag_name().name() == "tc")
                .map(|tc| {
                    tc.descendants()
                        .filter(|n| n.is_element() && n.tag_name().name() == "t")
                        .filter_map(|t| t.text())
                        .collect::<String>()
                })
                .collect()
        })
        .collect()
}
