use crate::package_metadata::domain::{
    DataType, PurlType, StorageType, SyncConfiguration, VersionFormat,
};
use crate::shared::error::SyncError;
use crate::shared::Result;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 200;
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(750);
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_RUN_DURATION: Duration = Duration::from_secs(240);

/// Ecosystems synced when none are configured
pub const DEFAULT_PURL_TYPES: &[&str] = &[
    "composer",
    "conan",
    "gem",
    "golang",
    "maven",
    "npm",
    "nuget",
    "pypi",
    "apk",
    "rpm",
    "deb",
    "cbl-mariner",
    "wolfi",
    "swift",
];

/// SyncSettings - Run settings for the sync use case
///
/// Values are kept raw (strings) where validating them is part of the run,
/// so that a bad value is reported as a configuration failure of the run
/// rather than crashing whoever built the settings.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub storage_type: String,
    pub purl_types: Vec<String>,
    pub license_version_format: VersionFormat,
    pub batch_size: usize,
    /// Pause after each ingested batch; `Duration::ZERO` disables it
    pub throttle: Duration,
    pub lease_ttl: Duration,
    pub max_run_duration: Duration,
    pub shard: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            storage_type: StorageType::OfflineBundle.to_string(),
            purl_types: DEFAULT_PURL_TYPES.iter().map(|s| s.to_string()).collect(),
            license_version_format: VersionFormat::V2,
            batch_size: DEFAULT_BATCH_SIZE,
            throttle: DEFAULT_THROTTLE,
            lease_ttl: DEFAULT_LEASE_TTL,
            max_run_duration: DEFAULT_MAX_RUN_DURATION,
            shard: 0,
        }
    }
}

impl SyncSettings {
    /// Lease key shared by every worker syncing `data_type` on this shard
    pub fn lease_key(&self, data_type: DataType) -> String {
        format!("package_metadata_sync:{}:{}", data_type, self.shard)
    }

    /// Validates the settings and builds the configurations for `data_type`
    ///
    /// # Errors
    /// Returns a configuration error for an unknown storage type, an invalid
    /// purl type, an empty purl type list or a zero batch size.
    pub fn resolve_configurations(&self, data_type: DataType) -> Result<Vec<SyncConfiguration>> {
        let storage_type = StorageType::parse(&self.storage_type)?;

        if self.batch_size == 0 {
            return Err(SyncError::configuration(
                "batch size must be greater than zero",
                "Set batch_size to a positive number (default: 200)",
            )
            .into());
        }

        if self.max_run_duration >= self.lease_ttl {
            return Err(SyncError::configuration(
                format!(
                    "max run duration ({}s) must be shorter than the lease TTL ({}s)",
                    self.max_run_duration.as_secs(),
                    self.lease_ttl.as_secs()
                ),
                "Lower max_run_duration_secs or raise lease_ttl_secs",
            )
            .into());
        }

        if self.purl_types.is_empty() && data_type != DataType::CveEnrichment {
            return Err(SyncError::configuration(
                format!("no purl types configured for {}", data_type),
                "List at least one ecosystem in purl_types",
            )
            .into());
        }

        let purl_types = self
            .purl_types
            .iter()
            .map(|value| {
                PurlType::new(value.clone()).map_err(|e| {
                    anyhow::Error::from(SyncError::configuration(
                        e.to_string(),
                        "Use lower-case ecosystem names such as 'npm' or 'cbl-mariner'",
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SyncConfiguration::configs_for(
            data_type,
            storage_type,
            &purl_types,
            self.license_version_format,
        ))
    }
}
