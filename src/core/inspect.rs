// src/core/inspect.rs
//
// Read-only template diagnostics for template authors: which content
// controls a package carries, per part, and the shape of each table. Uses
// roxmltree since nothing here mutates.

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use roxmltree::{Document, Node};
use serde::Serialize;
use zip::ZipArchive;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub parts: Vec<PartSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartSummary {
    pub part: String,
    pub controls: Vec<ControlInfo>,
    pub tables: Vec<TableShape>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlInfo {
    pub tag: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableShape {
    pub rows: usize,
    /// Rows containing at least one placeholder cell.
    pub placeholder_rows: usize,
    pub widest_row_cells: usize,
}

/// Summarize every content-bearing part of a template package.
pub fn inspect_template(template: &[u8]) -> Result<TemplateSummary> {
    let mut archive =
        ZipArchive::new(Cursor::new(template)).context("template is not a readable zip package")?;

    let names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|e| e.name().to_string()))
        .filter(|name| {
            name == "word/document.xml"
                || ((name.starts_with("word/header") || name.starts_with("word/footer"))
                    && name.ends_with(".xml"))
        })
        .collect();

    let mut parts = Vec::new();
    for name in names {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .with_context(|| format!("failed to reopen '{name}'"))?
            .read_to_string(&mut xml)
            .with_context(|| format!("failed to read '{name}'"))?;
        let doc = Document::parse(&xml).with_context(|| format!("failed to parse '{name}'"))?;
        parts.push(summarize_part(&name, &doc));
    }

    Ok(TemplateSummary { parts })
}

fn summarize_part(name: &str, doc: &Document) -> PartSummary {
    let root = doc.root_element();

    let controls = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "sdt")
        .filter_map(|sdt| control_info(&sdt))
        .collect();

    let tables = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "tbl")
        .map(|tbl| table_shape(&tbl))
        .collect();

    PartSummary {
        part: name.to_string(),
        controls,
        tables,
    }
}

fn control_info(sdt: &Node) -> Option<ControlInfo> {
    let props = sdt
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "sdtPr")?;
    let tag = props
        .children()
        .find(|n| n.tag_name().name() == "tag")
        .and_then(|n| n.attribute((W_NS, "val")))
        .map(|s| s.to_string());
    let alias = props
        .children()
        .find(|n| n.tag_name().name() == "alias")
        .and_then(|n| n.attribute((W_NS, "val")))
        .map(|s| s.to_string());
    Some(ControlInfo { tag, alias })
}

fn table_shape(tbl: &Node) -> TableShape {
    let mut rows = 0usize;
    let mut placeholder_rows = 0usize;
    let mut widest = 0usize;
    for tr in tbl
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "tr")
    {
        rows += 1;
        let cells = tr
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "tc")
            .count();
        widest = widest.max(cells);
        let has_control = tr
            .descendants()
            .any(|n| n.is_element() && n.tag_name().name() == "sdt");
        if has_control {
            placeholder_rows += 1;
        }
    }
    TableShape {
        rows,
        placeholder_rows,
        widest_row_cells: widest,
    }
}
