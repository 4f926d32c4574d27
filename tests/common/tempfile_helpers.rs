//! Helper functions for tempfile usage in tests

use anyhow::Context;
use std::path::Path;

use litecnn::loader::WeightWriter;

/// Create a named temp file with a helpful error message.
pub fn create_temp_file() -> anyhow::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new().context("Failed to create temporary file for test")
}

/// Create a temp directory with a helpful error message.
pub fn create_temp_dir() -> anyhow::Result<tempfile::TempDir> {
    tempfile::tempdir().context("Failed to create temporary directory for test")
}

/// Serialize `writer` into a fresh temp file
pub fn write_weight_file(writer: &WeightWriter) -> anyhow::Result<tempfile::NamedTempFile> {
    let file = tempfile::NamedTempFile::with_suffix(".bin")
        .context("Failed to create temporary weight file")?;
    writer
        .write_to_path(file.path())
        .with_context(|| format!("Failed to write weights to {}", file.path().display()))?;
    Ok(file)
}

/// Write a label JSON file into `dir`
pub fn write_labels(dir: &Path, json: &str) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join("labels.json");
    std::fs::write(&path, json).context("Failed to write label file")?;
    Ok(path)
}

pub use tempfile::{NamedTempFile, TempDir};
