// src/core/control.rs
//
// Content-control (w:sdt) resolution and substitution. A control's identity
// is its w:tag value when present, else its w:alias; comparisons are
// case-insensitive. Substitution keeps the first run's character formatting
// (and the first paragraph's properties for block controls) on the single
// run that carries the new value.

use std::collections::HashMap;

use crate::core::xml::{XmlElement, XmlNode};

pub fn is_control(el: &XmlElement) -> bool {
    el.is("sdt")
}

/// Tag if present, else alias. Blank values count as absent.
pub fn control_key(sdt: &XmlElement) -> Option<&str> {
    let props = sdt.first_child("sdtPr")?;
    props
        .first_child("tag")
        .and_then(|t| t.attr("val"))
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            props
                .first_child("alias")
                .and_then(|a| a.attr("val"))
                .filter(|v| !v.trim().is_empty())
        })
}

pub fn key_matches(sdt: &XmlElement, wanted: &str) -> bool {
    control_key(sdt).is_some_and(|k| k.to_lowercase() == wanted.to_lowercase())
}

pub fn contains_control(el: &XmlElement) -> bool {
    el.descendants().any(is_control)
}

/// Replace the control's content with `value`, preserving captured
/// formatting. Whitespace in `value` is significant.
pub fn set_control_text(sdt: &mut XmlElement, value: &str) {
    if let Some(content) = sdt.first_child_mut("sdtContent") {
        replace_region_text(content, value);
    }
}

fn replace_region_text(region: &mut XmlElement, value: &str) {
    // Row- and cell-wrapped controls keep their structural nodes; the text
    // lands inside the first cell instead.
    if region.first_child("tr").is_some() {
        if let Some(cell) = region
            .first_child_mut("tr")
            .and_then(|tr| tr.first_child_mut("tc"))
        {
            replace_cell_text(cell, value);
        }
        return;
    }
    if let Some(cell) = region.first_child_mut("tc") {
        replace_cell_text(cell, value);
        return;
    }

    let para_props = first_descendant(region, "p").and_then(|p| p.first_child("pPr")).cloned();
    let run_props = first_descendant(region, "r").and_then(|r| r.first_child("rPr")).cloned();
    let block = region.child_elements().any(|el| el.is("p") || el.is("tbl"));

    region.children.clear();
    if block {
        region.push_element(new_paragraph(value, para_props, run_props));
    } else {
        region.push_element(new_run(value, run_props));
    }
}

fn replace_cell_text(cell: &mut XmlElement, value: &str) {
    let para_props = first_descendant(cell, "p").and_then(|p| p.first_child("pPr")).cloned();
    let run_props = first_descendant(cell, "r").and_then(|r| r.first_child("rPr")).cloned();
    cell.children
        .retain(|n| matches!(n, XmlNode::Element(el) if el.is("tcPr")));
    cell.push_element(new_paragraph(value, para_props, run_props));
}

fn first_descendant<'a>(scope: &'a XmlElement, local: &str) -> Option<&'a XmlElement> {
    scope.descendants().find(|el| el.is(local))
}

fn new_paragraph(
    value: &str,
    para_props: Option<XmlElement>,
    run_props: Option<XmlElement>,
) -> XmlElement {
    let mut paragraph = XmlElement::new("w:p");
    if let Some(ppr) = para_props {
        paragraph.push_element(ppr);
    }
    paragraph.push_element(new_run(value, run_props));
    paragraph
}

fn new_run(value: &str, run_props: Option<XmlElement>) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if let Some(rpr) = run_props {
        run.push_element(rpr);
    }
    let mut text = XmlElement::new("w:t");
    if value != value.trim() {
        text.set_attr("xml:space", "preserve");
    }
    if !value.is_empty() {
        text.push_text(value);
    }
    run.push_element(text);
    run
}

/// Keyed substitution over a scope: every control whose key matches an entry
/// of the lowercase-keyed `map` gets that value; the rest stay untouched.
/// Returns the number of controls filled.
pub fn fill_controls(scope: &mut XmlElement, map: &HashMap<String, String>) -> usize {
    let mut filled = 0usize;
    scope.for_each_element_mut(&mut |el| {
        if !is_control(el) {
            return;
        }
        let Some(key) = control_key(el).map(|k| k.to_lowercase()) else {
            return;
        };
        if let Some(value) = map.get(&key) {
            set_control_text(el, value);
            filled += 1;
        } else {
            log::debug!("no value for control '{key}', leaving template content");
        }
    });
    filled
}

/// Positional substitution: the i-th control in document order takes the
/// i-th value; once values run out the remaining controls are emptied.
/// `next` carries the position across a row pair.
pub fn fill_controls_in_order(scope: &mut XmlElement, values: &[String], next: &mut usize) {
    scope.for_each_element_mut(&mut |el| {
        if !is_control(el) {
            return;
        }
        let value = values.get(*next).map(String::as_str).unwrap_or("");
        *next += 1;
        set_control_text(el, value);
    });
}

/// Lowercase-fold the caller's keys once per input row.
pub fn fold_keys(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}
