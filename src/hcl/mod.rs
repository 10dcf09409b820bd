pub mod parser;

use std::path::Path;

use anyhow::{Context, Result};

use crate::error::ConvertError;

/// Parse HCL source text into a body, mapping parser failures into the
/// conversion error taxonomy with a remediation hint.
pub fn parse_source(filename: &str, source: &str) -> Result<hcl::Body, ConvertError> {
    hcl::from_str(source).map_err(|err| ConvertError::Parse {
        file: filename.to_string(),
        message: err.to_string(),
        hint: "the input must be valid Terraform HCL; run `terraform validate` on it first"
            .to_string(),
    })
}

/// Read all .tf files in a directory and concatenate them into a single
/// source, in filename order. Used by the CLI; the library entry point
/// takes source text directly.
pub fn read_directory(dir: &Path) -> Result<String> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    let mut tf_files: Vec<std::path::PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "tf").unwrap_or(false))
        .collect();
    tf_files.sort();

    if tf_files.is_empty() {
        anyhow::bail!("No .tf files found in directory: {}", dir.display());
    }

    let mut combined = String::new();
    for file in &tf_files {
        tracing::debug!("reading HCL file: {}", file.display());
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        combined.push_str(&content);
        if !combined.ends_with('\n') {
            combined.push('\n');
        }
    }
    Ok(combined)
}
