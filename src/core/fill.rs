// src/core/fill.rs
//
// Entry orchestration: template bytes + fill request in, filled bytes out.
// Scalars run first across every part; table population prefers keyed rows
// over ordered rows; no table input leaves the table untouched.

use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::core::control::{fill_controls, fold_keys};
use crate::core::expand::{populate_table, RowInput};
use crate::core::package::DocxPackage;
use crate::FillRequest;

/// Fill a template with the request's data, producing a new document.
/// The template bytes are copied up front and never mutated.
pub fn fill_document(template: &[u8], request: &FillRequest) -> Result<Vec<u8>> {
    let mut package = DocxPackage::open(template)?;
    package.body_mut()?;

    if let Some(scalars) = request.scalars.as_ref().filter(|m| !m.is_empty()) {
        apply_scalars(&mut package, scalars);
    }

    let table_tag = request.table_tag.as_deref();
    if let Some(rows) = request.rows_by_tag.as_ref().filter(|r| !r.is_empty()) {
        let produced = populate_table(
            package.body_mut()?,
            table_tag,
            request.template_row_index,
            RowInput::Keyed(rows),
        )?;
        info!("keyed fill produced {produced} records");
    } else if let Some(rows) = request.rows_by_order.as_ref().filter(|r| !r.is_empty()) {
        let produced = populate_table(
            package.body_mut()?,
            table_tag,
            request.template_row_index,
            RowInput::Ordered(rows),
        )?;
        info!("ordered fill produced {produced} records");
    } else {
        debug!("no table rows in request, table left untouched");
    }

    package.save()
}

/// Stream-friendly wrapper: reads the template to completion into a private
/// buffer first, so the caller's reader is never reused by the pipeline.
pub fn fill_document_from_reader<R: Read>(mut reader: R, request: &FillRequest) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .context("failed to read template stream")?;
    fill_document(&buffer, request)
}

/// Scalar filler: keyed substitution across the main body and every header
/// and footer part. Controls without a matching key keep their template text.
fn apply_scalars(package: &mut DocxPackage, scalars: &HashMap<String, String>) {
    let folded = fold_keys(scalars);
    let mut filled = 0usize;
    for root in package.part_roots_mut() {
        filled += fill_controls(root, &folded);
    }
    debug!("scalar fill touched {filled} controls");
}
