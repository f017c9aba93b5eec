// src/utils/loader.rs
//
// Template path resolution and loading. The path comes from the caller or
// the DOCFILL_TEMPLATE environment variable and must exist before a fill is
// attempted. Large templates are memory-mapped instead of read.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use memmap2::Mmap;

pub const TEMPLATE_ENV_VAR: &str = "DOCFILL_TEMPLATE";

const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Explicit path wins; otherwise fall back to the environment.
pub fn resolve_template_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match std::env::var(TEMPLATE_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        _ => bail!("no template path given; pass one or set {TEMPLATE_ENV_VAR}"),
    }
}

/// Read the template into memory, memory-mapping files over 10 MiB.
pub fn load_template(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        bail!("template not found at '{}'", path.display());
    }
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat template '{}'", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        debug!("memory-mapping large template ({} bytes)", metadata.len());
        let file = File::open(path)
            .with_context(|| format!("failed to open template '{}'", path.display()))?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(mmap.to_vec())
    } else {
        std::fs::read(path).with_context(|| format!("failed to read template '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_template_path(Some(Path::new("a/b.docx"))).unwrap();
        assert_eq!(path, PathBuf::from("a/b.docx"));
    }

    #[test]
    fn missing_template_names_the_path() {
        let err = load_template(Path::new("/nonexistent/t.docx"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("/nonexistent/t.docx"), "{err}");
    }
}
