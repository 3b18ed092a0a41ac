use crate::package_metadata::domain::{Advisory, CompressedPackage, CveEnrichment, PurlType};
use crate::shared::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// License set of a single package version, as written by the legacy stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionLicenses {
    pub purl_type: PurlType,
    pub name: String,
    pub version: String,
    pub licenses: BTreeSet<String>,
}

impl PackageVersionLicenses {
    pub fn identity(&self) -> (&str, &str, &str) {
        (self.purl_type.as_str(), &self.name, &self.version)
    }
}

/// IngestionSink port for durable storage of domain objects
///
/// Every method is an idempotent upsert keyed by the identity of the
/// object, and returns the number of rows written.
///
/// # Errors
/// Storage failures are returned as-is; callers abort the stream and leave
/// the checkpoint where it was.
#[async_trait]
pub trait IngestionSink: Send + Sync {
    /// Upserts by `(source_xid, advisory_xid)`, replacing affected packages
    async fn upsert_advisories(&self, advisories: &[Advisory]) -> Result<usize>;

    /// Upserts by `(purl_type, name)`, replacing the stored license data
    async fn upsert_packages(&self, packages: &[CompressedPackage]) -> Result<usize>;

    /// Upserts by `(purl_type, name, version)`, merging license sets
    async fn upsert_package_versions(&self, rows: &[PackageVersionLicenses]) -> Result<usize>;

    /// Upserts by `cve_id`
    async fn upsert_cve_enrichments(&self, enrichments: &[CveEnrichment]) -> Result<usize>;
}

#[async_trait]
impl<T: IngestionSink + ?Sized> IngestionSink for Arc<T> {
    async fn upsert_advisories(&self, advisories: &[Advisory]) -> Result<usize> {
        (**self).upsert_advisories(advisories).await
    }

    async fn upsert_packages(&self, packages: &[CompressedPackage]) -> Result<usize> {
        (**self).upsert_packages(packages).await
    }

    async fn upsert_package_versions(&self, rows: &[PackageVersionLicenses]) -> Result<usize> {
        (**self).upsert_package_versions(rows).await
    }

    async fn upsert_cve_enrichments(&self, enrichments: &[CveEnrichment]) -> Result<usize> {
        (**self).upsert_cve_enrichments(enrichments).await
    }
}
