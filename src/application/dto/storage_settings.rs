use crate::package_metadata::domain::DataType;
use std::path::PathBuf;

/// Public endpoint of the bucket JSON API
pub const DEFAULT_BUCKET_BASE_URL: &str = "https://storage.googleapis.com/storage/v1";

/// Buckets of the remote storage, one per data type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSettings {
    pub base_url: String,
    pub advisories: Option<String>,
    pub licenses: Option<String>,
    pub cve_enrichment: Option<String>,
}

impl Default for BucketSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BUCKET_BASE_URL.to_string(),
            advisories: None,
            licenses: None,
            cve_enrichment: None,
        }
    }
}

impl BucketSettings {
    pub fn bucket_for(&self, data_type: DataType) -> Option<&str> {
        match data_type {
            DataType::Advisories => self.advisories.as_deref(),
            DataType::Licenses => self.licenses.as_deref(),
            DataType::CveEnrichment => self.cve_enrichment.as_deref(),
        }
    }
}

/// StorageSettings - where the connectors find published files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    pub bucket: BucketSettings,
    pub bundle_path: Option<PathBuf>,
}
