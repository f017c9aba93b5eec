// src/core/expand.rs
//
// Row expander: replace the template record with one freshly filled record
// per input row. The pattern is built once from the untouched record; every
// pre-existing row after the record is dropped first, clones are inserted in
// input order, and only then is the original record removed.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use log::{debug, info};

use crate::core::control::{fill_controls, fill_controls_in_order, fold_keys};
use crate::core::record::{locate_record, RecordLocation};
use crate::core::xml::{XmlElement, XmlNode};

/// Table input, one entry per output row.
pub enum RowInput<'a> {
    /// Values consumed in document order, names ignored.
    Ordered(&'a [Vec<String>]),
    /// Values matched to controls by tag/alias, case-insensitive.
    Keyed(&'a [HashMap<String, String>]),
}

impl RowInput<'_> {
    fn len(&self) -> usize {
        match self {
            RowInput::Ordered(rows) => rows.len(),
            RowInput::Keyed(rows) => rows.len(),
        }
    }
}

/// Populate the target table, returning the number of records produced.
pub fn populate_table(
    body: &mut XmlElement,
    table_tag: Option<&str>,
    template_row_index: Option<usize>,
    input: RowInput<'_>,
) -> Result<usize> {
    let location = locate_record(body, table_tag, template_row_index)?;
    let table = body
        .element_at_path_mut(&location.table_path)
        .ok_or_else(|| anyhow!("resolved table path is no longer valid"))?;

    let (pattern_first, pattern_second) = build_pattern(table, &location)?;
    let produced = input.len();

    let record_end = location.second_row_index.unwrap_or(location.row_index);
    let removed = remove_rows_after(table, record_end);
    if removed > 0 {
        debug!("removed {removed} stale rows after the template record");
    }

    let mut insert_at = record_end + 1;
    match input {
        RowInput::Ordered(rows) => {
            for values in rows {
                let mut first = pattern_first.clone();
                let mut second = pattern_second.clone();
                let mut next = 0usize;
                fill_controls_in_order(&mut first, values, &mut next);
                if let Some(row) = second.as_mut() {
                    fill_controls_in_order(row, values, &mut next);
                }
                insert_at = insert_record(table, insert_at, first, second);
            }
        }
        RowInput::Keyed(rows) => {
            for map in rows {
                let folded = fold_keys(map);
                let mut first = pattern_first.clone();
                fill_controls(&mut first, &folded);
                let mut second = pattern_second.clone();
                if let Some(row) = second.as_mut() {
                    fill_controls(row, &folded);
                }
                insert_at = insert_record(table, insert_at, first, second);
            }
        }
    }

    // The originals go last: clones come from the untouched pattern and all
    // insertions land after them, so their indices are still valid here.
    if let Some(second_idx) = location.second_row_index {
        table.children.remove(second_idx);
    }
    table.children.remove(location.row_index);

    info!("table populated with {produced} records");
    Ok(produced)
}

fn build_pattern(
    table: &XmlElement,
    location: &RecordLocation,
) -> Result<(XmlElement, Option<XmlElement>)> {
    let mut first = table
        .children
        .get(location.row_index)
        .and_then(XmlNode::as_element)
        .cloned()
        .ok_or_else(|| anyhow!("template row index is no longer valid"))?;
    clear_header_flag(&mut first);

    let second = match location.second_row_index {
        Some(idx) => {
            let mut row = table
                .children
                .get(idx)
                .and_then(XmlNode::as_element)
                .cloned()
                .ok_or_else(|| anyhow!("template pair row index is no longer valid"))?;
            clear_header_flag(&mut row);
            Some(row)
        }
        None => None,
    };
    Ok((first, second))
}

/// Drop the repeated-header marker so expanded rows never render as table
/// headers.
fn clear_header_flag(row: &mut XmlElement) {
    if let Some(props) = row.first_child_mut("trPr") {
        props
            .children
            .retain(|n| !matches!(n, XmlNode::Element(el) if el.is("tblHeader")));
    }
}

/// Remove every `w:tr` child after `record_end`, whatever it contains.
/// Non-row children are left alone.
fn remove_rows_after(table: &mut XmlElement, record_end: usize) -> usize {
    let mut removed = 0usize;
    let mut i = table.children.len();
    while i > record_end + 1 {
        i -= 1;
        if matches!(&table.children[i], XmlNode::Element(el) if el.is("tr")) {
            table.children.remove(i);
            removed += 1;
        }
    }
    removed
}

fn insert_record(
    table: &mut XmlElement,
    mut insert_at: usize,
    first: XmlElement,
    second: Option<XmlElement>,
) -> usize {
    table.children.insert(insert_at, XmlNode::Element(first));
    insert_at += 1;
    if let Some(row) = second {
        table.children.insert(insert_at, XmlNode::Element(row));
        insert_at += 1;
    }
    insert_at
}
