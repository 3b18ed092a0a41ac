use crate::shared::security::open_regular_file;
use crate::shared::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufReader, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads a JSON document; a missing file reads as `None`
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path, max_size: u64) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = open_regular_file(path, "state", max_size)?;
    let document = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(document))
}

/// Replaces a JSON document atomically
///
/// The document is written to a temporary file in the same directory and
/// renamed over `path`, so readers see either the old or the new content.
pub(crate) fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    serde_json::to_writer(&mut temp, document)?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
