use super::{ingestion_error, narrow, IngestionService};
use crate::package_metadata::domain::{DataObject, DataObjectKind, LicenseRecord};
use crate::ports::outbound::{IngestionSink, PackageVersionLicenses};
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Groups legacy license lines into per-version license sets
///
/// The sink merges sets, so a version whose licenses are spread over
/// several batches or files ends up with all of them.
pub struct LicenseRecordIngestionService<'a> {
    sink: &'a dyn IngestionSink,
}

impl<'a> LicenseRecordIngestionService<'a> {
    pub fn new(sink: &'a dyn IngestionSink) -> Self {
        Self { sink }
    }

    fn group(records: Vec<LicenseRecord>) -> Vec<PackageVersionLicenses> {
        let mut grouped: BTreeMap<(String, String, String), PackageVersionLicenses> =
            BTreeMap::new();

        for record in records {
            let (purl_type, name, version) = record.identity();
            let key = (purl_type.to_string(), name.to_string(), version.to_string());
            grouped
                .entry(key)
                .or_insert_with(|| PackageVersionLicenses {
                    purl_type: record.purl_type().clone(),
                    name: record.name().to_string(),
                    version: record.version().to_string(),
                    licenses: Default::default(),
                })
                .licenses
                .insert(record.license().to_string());
        }

        grouped.into_values().collect()
    }
}

#[async_trait]
impl IngestionService for LicenseRecordIngestionService<'_> {
    async fn execute(&self, batch: Vec<DataObject>) -> Result<usize> {
        let records = narrow(batch, DataObjectKind::LicenseRecord, DataObject::into_license_record)?;
        let rows = Self::group(records);
        if rows.is_empty() {
            return Ok(0);
        }

        self.sink
            .upsert_package_versions(&rows)
            .await
            .map_err(|e| ingestion_error(DataObjectKind::LicenseRecord, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryIngestionSink;
    use crate::package_metadata::domain::PurlType;

    fn record(line: &str) -> DataObject {
        DataObject::LicenseRecord(
            LicenseRecord::from_csv_line(line, &PurlType::new("gem".to_string()).unwrap()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_groups_licenses_per_version() {
        let sink = InMemoryIngestionSink::new();
        let service = LicenseRecordIngestionService::new(&sink);

        let written = service
            .execute(vec![
                record("rails,7.0.0,MIT"),
                record("rails,7.0.0,Ruby"),
                record("rails,7.0.1,MIT"),
            ])
            .await
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(sink.package_version_count(), 2);
        assert_eq!(
            sink.package_version_licenses("gem", "rails", "7.0.0")
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_split_across_batches_converges() {
        let sink = InMemoryIngestionSink::new();
        let service = LicenseRecordIngestionService::new(&sink);

        service.execute(vec![record("rails,7.0.0,MIT")]).await.unwrap();
        service.execute(vec![record("rails,7.0.0,Ruby")]).await.unwrap();
        service.execute(vec![record("rails,7.0.0,MIT")]).await.unwrap();

        let licenses = sink
            .package_version_licenses("gem", "rails", "7.0.0")
            .unwrap();
        assert_eq!(
            licenses.into_iter().collect::<Vec<_>>(),
            vec!["MIT".to_string(), "Ruby".to_string()]
        );
    }
}
