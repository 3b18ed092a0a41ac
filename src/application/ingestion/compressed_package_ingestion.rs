use super::{dedup_last_wins, ingestion_error, narrow, IngestionService};
use crate::package_metadata::domain::{DataObject, DataObjectKind};
use crate::ports::outbound::IngestionSink;
use crate::shared::Result;
use async_trait::async_trait;

/// Replaces the stored license data of each package
pub struct CompressedPackageIngestionService<'a> {
    sink: &'a dyn IngestionSink,
}

impl<'a> CompressedPackageIngestionService<'a> {
    pub fn new(sink: &'a dyn IngestionSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl IngestionService for CompressedPackageIngestionService<'_> {
    async fn execute(&self, batch: Vec<DataObject>) -> Result<usize> {
        let packages = narrow(
            batch,
            DataObjectKind::CompressedPackage,
            DataObject::into_compressed_package,
        )?;
        let packages = dedup_last_wins(packages, |package| {
            let (purl_type, name) = package.identity();
            (purl_type.to_string(), name.to_string())
        });
        if packages.is_empty() {
            return Ok(0);
        }

        self.sink
            .upsert_packages(&packages)
            .await
            .map_err(|e| ingestion_error(DataObjectKind::CompressedPackage, e))
    }
}
