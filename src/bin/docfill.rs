use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use docfill_rs::utils::loader::{load_template, resolve_template_path};
use docfill_rs::{fill_document, inspect_template, FillRequest};

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("inspect") => {
            let template_path = resolve_template_path(args.get(1).map(|s| Path::new(s)))?;
            let template = load_template(&template_path)?;
            let summary = inspect_template(&template)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Some("fill") => {
            let request_path = args
                .get(1)
                .map(PathBuf::from)
                .context("usage: docfill fill <request.json> <output.docx> [template.docx]")?;
            let output_path = args
                .get(2)
                .map(PathBuf::from)
                .context("usage: docfill fill <request.json> <output.docx> [template.docx]")?;
            let template_path = resolve_template_path(args.get(3).map(|s| Path::new(s)))?;

            let request_json = std::fs::read_to_string(&request_path)
                .with_context(|| format!("failed to read request '{}'", request_path.display()))?;
            let request: FillRequest = serde_json::from_str(&request_json)
                .with_context(|| format!("invalid fill request in '{}'", request_path.display()))?;

            let template = load_template(&template_path)?;
            let output = fill_document(&template, &request)?;
            std::fs::write(&output_path, output)
                .with_context(|| format!("failed to write '{}'", output_path.display()))?;
            info!("filled document written to {}", output_path.display());
            Ok(())
        }
        _ => bail!(
            "usage: docfill fill <request.json> <output.docx> [template.docx]\n       docfill inspect [template.docx]"
        ),
    }
}
