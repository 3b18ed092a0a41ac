use advisory_sync::ports::outbound::PackageVersionLicenses;
use advisory_sync::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock IngestionSink that stores the first `healthy_calls` upserts and
/// fails every one after that
#[derive(Clone)]
pub struct FailingSink {
    inner: Arc<InMemoryIngestionSink>,
    healthy_calls: usize,
    calls: Arc<AtomicUsize>,
}

impl FailingSink {
    pub fn new() -> Self {
        Self::after(0)
    }

    pub fn after(healthy_calls: usize) -> Self {
        Self {
            inner: Arc::new(InMemoryIngestionSink::new()),
            healthy_calls,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn stored(&self) -> &InMemoryIngestionSink {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy_calls {
            anyhow::bail!("sink unavailable: connection reset by peer");
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionSink for FailingSink {
    async fn upsert_advisories(&self, advisories: &[Advisory]) -> Result<usize> {
        self.check()?;
        self.inner.upsert_advisories(advisories).await
    }

    async fn upsert_packages(&self, packages: &[CompressedPackage]) -> Result<usize> {
        self.check()?;
        self.inner.upsert_packages(packages).await
    }

    async fn upsert_package_versions(&self, rows: &[PackageVersionLicenses]) -> Result<usize> {
        self.check()?;
        self.inner.upsert_package_versions(rows).await
    }

    async fn upsert_cve_enrichments(&self, enrichments: &[CveEnrichment]) -> Result<usize> {
        self.check()?;
        self.inner.upsert_cve_enrichments(enrichments).await
    }
}
