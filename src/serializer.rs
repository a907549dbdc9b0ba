//! Serialization of the output bundle to YAML or JSON.
//!
//! This module renders a [`Bundle`] and writes it to a file or returns it as a
//! string.

use crate::bundle::Bundle;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a bundle to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(bundle: &Bundle) -> Result<String> {
    debug!("Serializing bundle to YAML");
    serde_yaml::to_string(bundle).context("Failed to serialize bundle to YAML")
}

/// Serializes a bundle to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(bundle: &Bundle) -> Result<String> {
    debug!("Serializing bundle to JSON");
    serde_json::to_string_pretty(bundle).context("Failed to serialize bundle to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and its parent directories if they don't exist, or
/// overwrites an existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
