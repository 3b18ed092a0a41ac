use crate::package_metadata::domain::{Advisory, CompressedPackage, CveEnrichment};
use crate::ports::outbound::{IngestionSink, PackageVersionLicenses};
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

type AdvisoryKey = (String, String);
type PackageKey = (String, String);
type PackageVersionKey = (String, String, String);

/// In-process IngestionSink keyed by each object's identity
///
/// Used by tests and dry runs. Upserts replace entries with the same key;
/// package version license sets are merged.
#[derive(Debug, Default)]
pub struct InMemoryIngestionSink {
    advisories: DashMap<AdvisoryKey, Advisory>,
    packages: DashMap<PackageKey, CompressedPackage>,
    package_versions: DashMap<PackageVersionKey, BTreeSet<String>>,
    cve_enrichments: DashMap<String, CveEnrichment>,
    upsert_calls: AtomicUsize,
}

impl InMemoryIngestionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advisory_count(&self) -> usize {
        self.advisories.len()
    }

    pub fn advisory(&self, source_xid: &str, advisory_xid: &str) -> Option<Advisory> {
        self.advisories
            .get(&(source_xid.to_string(), advisory_xid.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn package(&self, purl_type: &str, name: &str) -> Option<CompressedPackage> {
        self.packages
            .get(&(purl_type.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn package_version_count(&self) -> usize {
        self.package_versions.len()
    }

    pub fn package_version_licenses(
        &self,
        purl_type: &str,
        name: &str,
        version: &str,
    ) -> Option<BTreeSet<String>> {
        self.package_versions
            .get(&(purl_type.to_string(), name.to_string(), version.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn cve_enrichment_count(&self) -> usize {
        self.cve_enrichments.len()
    }

    pub fn cve_enrichment(&self, cve_id: &str) -> Option<CveEnrichment> {
        self.cve_enrichments
            .get(cve_id)
            .map(|entry| entry.value().clone())
    }

    /// Number of upsert calls received, of any kind
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn count_call(&self) {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IngestionSink for InMemoryIngestionSink {
    async fn upsert_advisories(&self, advisories: &[Advisory]) -> Result<usize> {
        self.count_call();
        for advisory in advisories {
            let (source_xid, advisory_xid) = advisory.identity();
            self.advisories.insert(
                (source_xid.to_string(), advisory_xid.to_string()),
                advisory.clone(),
            );
        }
        Ok(advisories.len())
    }

    async fn upsert_packages(&self, packages: &[CompressedPackage]) -> Result<usize> {
        self.count_call();
        for package in packages {
            let (purl_type, name) = package.identity();
            self.packages
                .insert((purl_type.to_string(), name.to_string()), package.clone());
        }
        Ok(packages.len())
    }

    async fn upsert_package_versions(&self, rows: &[PackageVersionLicenses]) -> Result<usize> {
        self.count_call();
        for row in rows {
            let (purl_type, name, version) = row.identity();
            self.package_versions
                .entry((purl_type.to_string(), name.to_string(), version.to_string()))
                .or_default()
                .extend(row.licenses.iter().cloned());
        }
        Ok(rows.len())
    }

    async fn upsert_cve_enrichments(&self, enrichments: &[CveEnrichment]) -> Result<usize> {
        self.count_call();
        for enrichment in enrichments {
            self.cve_enrichments
                .insert(enrichment.cve_id().to_string(), enrichment.clone());
        }
        Ok(enrichments.len())
    }
}
