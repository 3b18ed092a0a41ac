//! Configuration file support for advisory-sync.
//!
//! Provides YAML-based configuration through `advisory-sync.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::package_metadata::domain::VersionFormat;
use crate::shared::error::SyncError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "advisory-sync.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub storage_type: Option<String>,
    pub bucket: Option<BucketSection>,
    pub bundle_path: Option<PathBuf>,
    pub purl_types: Option<Vec<String>>,
    pub license_version_format: Option<VersionFormat>,
    pub batch_size: Option<usize>,
    pub throttle_ms: Option<u64>,
    pub lease_ttl_secs: Option<u64>,
    pub max_run_duration_secs: Option<u64>,
    pub shard: Option<u32>,
    pub state_dir: Option<PathBuf>,
    pub sink_dir: Option<PathBuf>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Remote bucket names, one per data type.
#[derive(Debug, Deserialize, Default)]
pub struct BucketSection {
    pub base_url: Option<String>,
    pub advisories: Option<String>,
    pub licenses: Option<String>,
    pub cve_enrichment: Option<String>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.batch_size == Some(0) {
        return Err(SyncError::configuration(
            "batch_size must be greater than zero",
            "Remove batch_size to use the default of 200",
        )
        .into());
    }

    if let Some(purl_types) = &config.purl_types {
        if purl_types.is_empty() {
            return Err(SyncError::configuration(
                "purl_types must not be empty",
                "Remove purl_types to sync every supported ecosystem",
            )
            .into());
        }
    }

    if let (Some(ttl), Some(max_run)) = (config.lease_ttl_secs, config.max_run_duration_secs) {
        if max_run >= ttl {
            return Err(SyncError::configuration(
                format!(
                    "max_run_duration_secs ({}) must be less than lease_ttl_secs ({})",
                    max_run, ttl
                ),
                "Leave a safety margin so a run stops before its lease expires",
            )
            .into());
        }
    }

    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        tracing::warn!(field = %key, "unknown config field will be ignored");
    }
    if let Some(bucket) = &config.bucket {
        for key in bucket.unknown_fields.keys() {
            tracing::warn!(field = %format!("bucket.{}", key), "unknown config field will be ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.yml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
storage_type: remote_bucket
bucket:
  base_url: http://localhost:4443/storage/v1
  advisories: advisories-export
  licenses: licenses-export
purl_types:
  - npm
  - pypi
license_version_format: v1
batch_size: 50
throttle_ms: 0
lease_ttl_secs: 120
max_run_duration_secs: 90
shard: 2
state_dir: /var/lib/advisory-sync
"#,
        );

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.storage_type.as_deref(), Some("remote_bucket"));
        let bucket = config.bucket.unwrap();
        assert_eq!(bucket.advisories.as_deref(), Some("advisories-export"));
        assert!(bucket.cve_enrichment.is_none());
        assert_eq!(
            config.purl_types.as_deref(),
            Some(&["npm".to_string(), "pypi".to_string()][..])
        );
        assert_eq!(config.license_version_format, Some(VersionFormat::V1));
        assert_eq!(config.batch_size, Some(50));
        assert_eq!(config.throttle_ms, Some(0));
        assert_eq!(config.shard, Some(2));
        assert_eq!(
            config.state_dir.as_deref(),
            Some(Path::new("/var/lib/advisory-sync"))
        );
        assert!(config.unknown_fields.is_empty());
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "shard: 1\n").unwrap();

        let config = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.shard, Some(1));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_config_from_path(&dir.path().join("missing.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "batch_size: [unclosed\n");
        let err = load_config_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_fields_are_kept_for_warning() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "shard: 0\nretries: 3\n");
        let config = load_config_from_path(&path).unwrap();
        assert!(config.unknown_fields.contains_key("retries"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "batch_size: 0\n");
        let err = load_config_from_path(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::Configuration { .. })
        ));
    }

    #[test]
    fn test_empty_purl_types_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "purl_types: []\n");
        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn test_max_run_not_below_lease_ttl_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "lease_ttl_secs: 60\nmax_run_duration_secs: 60\n");
        let err = load_config_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("must be less than lease_ttl_secs"));
    }

    #[test]
    fn test_unknown_license_version_format_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "license_version_format: v3\n");
        assert!(load_config_from_path(&path).is_err());
    }
}
