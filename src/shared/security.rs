use crate::shared::Result;
use std::fs::{self, File};
use std::path::{Component, Path};

/// Largest published file the bundle source will open (512 MB)
pub const MAX_BUNDLE_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Largest state document (checkpoint or lease) the stores will read (64 KB)
pub const MAX_STATE_FILE_SIZE: u64 = 64 * 1024;

/// Opens a regular file after checking that it is not a symbolic link and
/// not larger than `max_size`.
///
/// # Arguments
/// * `path` - File to open
/// * `description` - What the file is, for error messages
/// * `max_size` - Size limit in bytes
///
/// # Errors
/// Returns an error if the file is missing, is a symlink or a directory,
/// or is too large.
pub fn open_regular_file(path: &Path, description: &str, max_size: u64) -> Result<File> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read {} metadata at {}: {}",
            description,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. Symbolic links are not followed inside {} directories.",
            path.display(),
            description
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    if metadata.len() > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            metadata.len(),
            max_size
        );
    }

    File::open(path).map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))
}

/// Rejects relative names that could escape the directory they are joined to
///
/// Object names come from remote listings and state keys from settings, so
/// both go through this before becoming paths.
pub fn validate_relative_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("Name cannot be empty");
    }

    let escapes = Path::new(name)
        .components()
        .any(|component| !matches!(component, Component::Normal(_)));
    if escapes {
        anyhow::bail!(
            "Security: '{}' is not a plain relative name (absolute paths and '..' are rejected)",
            name
        );
    }

    Ok(())
}
