use super::json_document::{read_document, write_document};
use crate::package_metadata::domain::{Advisory, CompressedPackage, CveEnrichment};
use crate::ports::outbound::{IngestionSink, PackageVersionLicenses};
use crate::shared::security::{validate_relative_name, MAX_STATE_FILE_SIZE};
use crate::shared::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// FileIngestionSink adapter storing one JSON document per object identity
///
/// Layout under the sink directory:
/// - `advisories/<source_xid>/<advisory_xid>.json`
/// - `packages/<purl_type>/<name>.json`
/// - `package_versions/<purl_type>/<name>/<version>.json`
/// - `cve_enrichments/<cve_id>.json`
///
/// Identity parts are percent-encoded, so scoped names such as
/// `@babel/core` stay a single path segment.
pub struct FileIngestionSink {
    root: PathBuf,
}

impl FileIngestionSink {
    pub fn new(sink_dir: &Path) -> Self {
        Self {
            root: sink_dir.to_path_buf(),
        }
    }

    fn document_path(&self, collection: &str, identity: &[&str]) -> Result<PathBuf> {
        let mut segments: Vec<String> = identity
            .iter()
            .map(|part| urlencoding::encode(part).into_owned())
            .collect();
        if let Some(last) = segments.last_mut() {
            last.push_str(".json");
        }
        let relative = format!("{}/{}", collection, segments.join("/"));
        validate_relative_name(&relative)?;
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl IngestionSink for FileIngestionSink {
    async fn upsert_advisories(&self, advisories: &[Advisory]) -> Result<usize> {
        for advisory in advisories {
            let (source_xid, advisory_xid) = advisory.identity();
            let path = self.document_path("advisories", &[source_xid, advisory_xid])?;
            write_document(&path, advisory)?;
        }
        Ok(advisories.len())
    }

    async fn upsert_packages(&self, packages: &[CompressedPackage]) -> Result<usize> {
        for package in packages {
            let (purl_type, name) = package.identity();
            let path = self.document_path("packages", &[purl_type, name])?;
            write_document(&path, package)?;
        }
        Ok(packages.len())
    }

    async fn upsert_package_versions(&self, rows: &[PackageVersionLicenses]) -> Result<usize> {
        for row in rows {
            let (purl_type, name, version) = row.identity();
            let path = self.document_path("package_versions", &[purl_type, name, version])?;

            let merged = match read_document::<PackageVersionLicenses>(&path, MAX_STATE_FILE_SIZE)? {
                Some(mut stored) => {
                    stored.licenses.extend(row.licenses.iter().cloned());
                    stored
                }
                None => row.clone(),
            };
            write_document(&path, &merged)?;
        }
        Ok(rows.len())
    }

    async fn upsert_cve_enrichments(&self, enrichments: &[CveEnrichment]) -> Result<usize> {
        for enrichment in enrichments {
            let path = self.document_path("cve_enrichments", &[enrichment.cve_id()])?;
            write_document(&path, enrichment)?;
        }
        Ok(enrichments.len())
    }
}
