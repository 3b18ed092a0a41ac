use crate::shared::error::SyncError;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for purl type identifiers
const MAX_PURL_TYPE_LENGTH: usize = 32;

/// Purl types that describe operating system packages.
/// The license dataset only covers language ecosystems.
const OS_PURL_TYPES: &[&str] = &["apk", "rpm", "deb", "cbl-mariner", "wolfi"];

/// Published dataset families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Advisories,
    Licenses,
    CveEnrichment,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Advisories => "advisories",
            DataType::Licenses => "licenses",
            DataType::CveEnrichment => "cve_enrichment",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "advisories" => Ok(DataType::Advisories),
            "licenses" => Ok(DataType::Licenses),
            "cve_enrichment" => Ok(DataType::CveEnrichment),
            _ => Err(format!(
                "Invalid data type: {}. Please specify 'advisories', 'licenses' or 'cve_enrichment'",
                s
            )),
        }
    }
}

/// Dataset export format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionFormat {
    V1,
    V2,
}

impl VersionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionFormat::V1 => "v1",
            VersionFormat::V2 => "v2",
        }
    }

    /// File extension used by files of this format
    pub fn file_extension(&self) -> &'static str {
        match self {
            VersionFormat::V1 => "csv",
            VersionFormat::V2 => "ndjson",
        }
    }
}

impl fmt::Display for VersionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" => Ok(VersionFormat::V1),
            "v2" => Ok(VersionFormat::V2),
            _ => Err(format!(
                "Invalid version format: {}. Please specify 'v1' or 'v2'",
                s
            )),
        }
    }
}

/// Where the published files are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    RemoteBucket,
    OfflineBundle,
}

impl StorageType {
    /// Parses a configured storage type; unknown values are configuration errors
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().replace('-', "_").as_str() {
            "remote_bucket" | "gcp" => Ok(StorageType::RemoteBucket),
            "offline_bundle" | "offline" => Ok(StorageType::OfflineBundle),
            _ => Err(SyncError::UnsupportedStorageType {
                value: value.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::RemoteBucket => f.write_str("remote_bucket"),
            StorageType::OfflineBundle => f.write_str("offline_bundle"),
        }
    }
}

/// NewType wrapper for a package ecosystem identifier ("purl type")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PurlType(String);

impl PurlType {
    pub fn new(value: String) -> Result<Self> {
        if value.is_empty() {
            anyhow::bail!("Purl type cannot be empty");
        }

        if value.len() > MAX_PURL_TYPE_LENGTH {
            anyhow::bail!(
                "Purl type is too long ({} bytes). Maximum allowed: {} bytes",
                value.len(),
                MAX_PURL_TYPE_LENGTH
            );
        }

        // Purl types become path segments and object name prefixes
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            anyhow::bail!(
                "Purl type '{}' contains invalid characters. Only lowercase ASCII letters, digits and hyphens are allowed.",
                value
            );
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this ecosystem describes operating system packages
    pub fn is_os_package_type(&self) -> bool {
        OS_PURL_TYPES.contains(&self.0.as_str())
    }
}

impl fmt::Display for PurlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one stream: the checkpoint key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey {
    pub data_type: DataType,
    pub version_format: VersionFormat,
    pub purl_type: Option<PurlType>,
}

impl CheckpointKey {
    /// Stable textual form, safe as a file name
    pub fn slug(&self) -> String {
        match &self.purl_type {
            Some(purl_type) => format!(
                "{}-{}-{}",
                self.data_type, self.version_format, purl_type
            ),
            None => format!("{}-{}", self.data_type, self.version_format),
        }
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}

/// Immutable descriptor of one data stream to synchronize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfiguration {
    data_type: DataType,
    version_format: VersionFormat,
    purl_type: Option<PurlType>,
    storage_type: StorageType,
}

impl SyncConfiguration {
    pub fn new(
        data_type: DataType,
        version_format: VersionFormat,
        purl_type: Option<PurlType>,
        storage_type: StorageType,
    ) -> Self {
        Self {
            data_type,
            version_format,
            purl_type,
            storage_type,
        }
    }

    /// Builds every configuration applicable to `data_type`.
    ///
    /// Advisories get one v2 stream per purl type, licenses one stream per
    /// language purl type in `license_format`, and CVE enrichment a single
    /// ecosystem-independent v2 stream.
    pub fn configs_for(
        data_type: DataType,
        storage_type: StorageType,
        purl_types: &[PurlType],
        license_format: VersionFormat,
    ) -> Vec<SyncConfiguration> {
        match data_type {
            DataType::Advisories => purl_types
                .iter()
                .map(|purl_type| {
                    Self::new(
                        data_type,
                        VersionFormat::V2,
                        Some(purl_type.clone()),
                        storage_type,
                    )
                })
                .collect(),
            DataType::Licenses => purl_types
                .iter()
                .filter(|purl_type| !purl_type.is_os_package_type())
                .map(|purl_type| {
                    Self::new(
                        data_type,
                        license_format,
                        Some(purl_type.clone()),
                        storage_type,
                    )
                })
                .collect(),
            DataType::CveEnrichment => vec![Self::new(
                data_type,
                VersionFormat::V2,
                None,
                storage_type,
            )],
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn version_format(&self) -> VersionFormat {
        self.version_format
    }

    pub fn purl_type(&self) -> Option<&PurlType> {
        self.purl_type.as_ref()
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    pub fn checkpoint_key(&self) -> CheckpointKey {
        CheckpointKey {
            data_type: self.data_type,
            version_format: self.version_format,
            purl_type: self.purl_type.clone(),
        }
    }

    /// Object name prefix of this stream, e.g. `v2/npm/`
    pub fn file_prefix(&self) -> String {
        match &self.purl_type {
            Some(purl_type) => format!("{}/{}/", self.version_format, purl_type),
            None => format!("{}/", self.version_format),
        }
    }

    pub fn file_extension(&self) -> &'static str {
        self.version_format.file_extension()
    }
}

impl fmt::Display for SyncConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.checkpoint_key(), self.storage_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purl(value: &str) -> PurlType {
        PurlType::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_data_type_from_str() {
        assert_eq!(DataType::from_str("advisories").unwrap(), DataType::Advisories);
        assert_eq!(DataType::from_str("LICENSES").unwrap(), DataType::Licenses);
        assert_eq!(
            DataType::from_str("cve-enrichment").unwrap(),
            DataType::CveEnrichment
        );
        assert!(DataType::from_str("sboms").is_err());
    }

    #[test]
    fn test_storage_type_parse_unknown_is_configuration_error() {
        let err = StorageType::parse("ftp").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::UnsupportedStorageType { .. })
        ));
    }

    #[test]
    fn test_storage_type_parse_aliases() {
        assert_eq!(StorageType::parse("gcp").unwrap(), StorageType::RemoteBucket);
        assert_eq!(
            StorageType::parse("offline-bundle").unwrap(),
            StorageType::OfflineBundle
        );
    }

    #[test]
    fn test_purl_type_validation() {
        assert!(PurlType::new("npm".to_string()).is_ok());
        assert!(PurlType::new("cbl-mariner".to_string()).is_ok());
        assert!(PurlType::new("".to_string()).is_err());
        assert!(PurlType::new("NPM".to_string()).is_err());
        assert!(PurlType::new("../etc".to_string()).is_err());
    }

    #[test]
    fn test_configs_for_advisories_covers_every_purl_type() {
        let purl_types = vec![purl("npm"), purl("deb")];
        let configs = SyncConfiguration::configs_for(
            DataType::Advisories,
            StorageType::RemoteBucket,
            &purl_types,
            VersionFormat::V1,
        );
        assert_eq!(configs.len(), 2);
        assert!(configs
            .iter()
            .all(|c| c.version_format() == VersionFormat::V2));
    }

    #[test]
    fn test_configs_for_licenses_skips_os_purl_types() {
        let purl_types = vec![purl("npm"), purl("deb"), purl("wolfi"), purl("gem")];
        let configs = SyncConfiguration::configs_for(
            DataType::Licenses,
            StorageType::OfflineBundle,
            &purl_types,
            VersionFormat::V1,
        );
        let names: Vec<&str> = configs
            .iter()
            .map(|c| c.purl_type().unwrap().as_str())
            .collect();
        assert_eq!(names, vec!["npm", "gem"]);
        assert!(configs
            .iter()
            .all(|c| c.version_format() == VersionFormat::V1));
    }

    #[test]
    fn test_configs_for_cve_enrichment_is_single_stream() {
        let configs = SyncConfiguration::configs_for(
            DataType::CveEnrichment,
            StorageType::RemoteBucket,
            &[purl("npm"), purl("gem")],
            VersionFormat::V2,
        );
        assert_eq!(configs.len(), 1);
        assert!(configs[0].purl_type().is_none());
        assert_eq!(configs[0].file_prefix(), "v2/");
    }

    #[test]
    fn test_checkpoint_key_slug() {
        let config = SyncConfiguration::new(
            DataType::Advisories,
            VersionFormat::V2,
            Some(purl("npm")),
            StorageType::RemoteBucket,
        );
        assert_eq!(config.checkpoint_key().slug(), "advisories-v2-npm");
        assert_eq!(config.file_prefix(), "v2/npm/");
        assert_eq!(config.file_extension(), "ndjson");
    }
}
