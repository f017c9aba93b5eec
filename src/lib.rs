pub mod core {
    pub mod control;
    pub mod expand;
    pub mod fill;
    pub mod inspect;
    pub mod package;
    pub mod record;
    pub mod xml;
}

pub mod utils {
    pub mod loader;
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use crate::core::fill::{fill_document, fill_document_from_reader};
pub use crate::core::inspect::{inspect_template, TemplateSummary};

/// Tag of the table wrapper the stock template ships with.
pub const DEFAULT_TABLE_TAG: &str = "studentsTbl";

/// One fill operation's worth of input. Exactly one of `rows_by_tag` /
/// `rows_by_order` is honored (keyed wins); with neither, the table is left
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FillRequest {
    /// Tag of the content control wrapping the target table. `None` falls
    /// back to sole-table resolution.
    pub table_tag: Option<String>,
    /// Positional fill: one ordered value list per output row.
    pub rows_by_order: Option<Vec<Vec<String>>>,
    /// Keyed fill: one tag-to-value map per output row, case-insensitive.
    pub rows_by_tag: Option<Vec<HashMap<String, String>>>,
    /// Flat substitutions applied across body, headers and footers.
    pub scalars: Option<HashMap<String, String>>,
    /// Zero-based row index overriding template-row detection.
    pub template_row_index: Option<usize>,
}

impl Default for FillRequest {
    fn default() -> Self {
        Self {
            table_tag: Some(DEFAULT_TABLE_TAG.to_string()),
            rows_by_order: None,
            rows_by_tag: None,
            scalars: None,
            template_row_index: None,
        }
    }
}
