// src/core/record.rs
//
// Record locator: resolve the target table (wrapper tag or sole body-level
// table) and pick the template record, one row or an adjacent pair. All
// results are child-index paths into the owned tree, never retained node
// references.

use anyhow::{anyhow, bail, Result};
use log::debug;

use crate::core::control::{contains_control, is_control, key_matches};
use crate::core::xml::{XmlElement, XmlNode};

/// Where the template record lives: path from the body to the table, plus
/// the record rows' child indices inside the table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLocation {
    pub table_path: Vec<usize>,
    pub row_index: usize,
    pub second_row_index: Option<usize>,
}

pub fn locate_record(
    body: &XmlElement,
    table_tag: Option<&str>,
    template_row_index: Option<usize>,
) -> Result<RecordLocation> {
    let table_path = resolve_table(body, table_tag)?;
    let table = body
        .element_at_path(&table_path)
        .ok_or_else(|| anyhow!("resolved table path is no longer valid"))?;

    let row_index = choose_template_row(table, template_row_index)?;
    let second_row_index = second_record_row(table, row_index);
    debug!(
        "template record at table child {row_index}, pair row: {:?}",
        second_row_index
    );

    Ok(RecordLocation {
        table_path,
        row_index,
        second_row_index,
    })
}

fn resolve_table(body: &XmlElement, table_tag: Option<&str>) -> Result<Vec<usize>> {
    if let Some(tag) = table_tag.filter(|t| !t.trim().is_empty()) {
        let wrappers = body.find_paths(&|el| is_control(el) && key_matches(el, tag));
        match wrappers.len() {
            0 => bail!(
                "no content control wrapper tagged '{tag}' was found; wrap exactly one table with that tag"
            ),
            1 => {}
            n => bail!("more than one table wrapper tagged '{tag}' found ({n}); keep exactly one"),
        }
        let wrapper_path = &wrappers[0];
        let wrapper = body
            .element_at_path(wrapper_path)
            .ok_or_else(|| anyhow!("wrapper path is no longer valid"))?;
        let tables = wrapper.find_paths(&|el| el.is("tbl"));
        let table_rel = tables
            .first()
            .ok_or_else(|| anyhow!("wrapper '{tag}' does not contain a table"))?;
        Ok(wrapper_path.iter().chain(table_rel.iter()).copied().collect())
    } else {
        let tables: Vec<usize> = body
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_element().filter(|el| el.is("tbl")).map(|_| i))
            .collect();
        match tables.len() {
            0 => bail!("no table found in the document body"),
            1 => Ok(vec![tables[0]]),
            n => bail!("document contains {n} tables; set a tableTag and wrap the intended one"),
        }
    }
}

/// Row indices (into the table's children) of its `w:tr` elements.
pub fn row_indices(table: &XmlElement) -> Vec<usize> {
    table
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, n)| n.as_element().filter(|el| el.is("tr")).map(|_| i))
        .collect()
}

fn choose_template_row(table: &XmlElement, explicit: Option<usize>) -> Result<usize> {
    let rows = row_indices(table);
    if rows.is_empty() {
        bail!("target table has no rows");
    }

    if let Some(idx) = explicit {
        if let Some(&child_idx) = rows.get(idx) {
            debug!("using explicit template row index {idx}");
            return Ok(child_idx);
        }
        debug!("templateRowIndex {idx} out of range ({} rows), falling back to detection", rows.len());
    }

    // Highest placeholder-cell count wins, ties broken by total cell count,
    // then first in document order.
    let mut best: Option<(usize, usize, usize)> = None;
    for &child_idx in &rows {
        let row = match table.children[child_idx].as_element() {
            Some(el) => el,
            None => continue,
        };
        let cell_count = row.child_elements().filter(|el| el.is("tc")).count();
        let control_cells = row
            .child_elements()
            .filter(|el| el.is("tc") && contains_control(el))
            .count();
        if control_cells == 0 {
            continue;
        }
        let beats = match best {
            None => true,
            Some((bc, bt, _)) => control_cells > bc || (control_cells == bc && cell_count > bt),
        };
        if beats {
            best = Some((control_cells, cell_count, child_idx));
        }
    }

    best.map(|(_, _, idx)| idx)
        .ok_or_else(|| anyhow!("no row with content controls found in the target table"))
}

/// The record extends to the next row only if that row is the immediate next
/// element sibling and itself contains a placeholder.
fn second_record_row(table: &XmlElement, row_index: usize) -> Option<usize> {
    for (offset, node) in table.children[row_index + 1..].iter().enumerate() {
        match node {
            XmlNode::Text(_) => continue,
            XmlNode::Element(el) => {
                if el.is("tr") && contains_control(el) {
                    return Some(row_index + 1 + offset);
                }
                return None;
            }
        }
    }
    None
}
