use crate::application::ingestion::{
    AdvisoryIngestionService, CompressedPackageIngestionService, CveEnrichmentIngestionService,
    IngestionService, LicenseRecordIngestionService,
};
use crate::package_metadata::domain::DataObjectKind;
use crate::ports::outbound::IngestionSink;

/// Factory for creating the ingestion service of a data object kind
pub struct IngestionServiceFactory;

impl IngestionServiceFactory {
    pub fn create<'a>(
        kind: DataObjectKind,
        sink: &'a dyn IngestionSink,
    ) -> Box<dyn IngestionService + 'a> {
        match kind {
            DataObjectKind::Advisory => Box::new(AdvisoryIngestionService::new(sink)),
            DataObjectKind::CompressedPackage => {
                Box::new(CompressedPackageIngestionService::new(sink))
            }
            DataObjectKind::LicenseRecord => Box::new(LicenseRecordIngestionService::new(sink)),
            DataObjectKind::CveEnrichment => Box::new(CveEnrichmentIngestionService::new(sink)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryIngestionSink;
    use crate::package_metadata::domain::{CveEnrichment, DataObject};
    use serde_json::json;

    #[tokio::test]
    async fn test_service_matches_kind() {
        let sink = InMemoryIngestionSink::new();
        let service = IngestionServiceFactory::create(DataObjectKind::CveEnrichment, &sink);
        let enrichment = CveEnrichment::from_record(json!({"cve_id": "CVE-2023-4863"})).unwrap();

        service
            .execute(vec![DataObject::CveEnrichment(enrichment)])
            .await
            .unwrap();

        assert_eq!(sink.cve_enrichment_count(), 1);
    }

    #[tokio::test]
    async fn test_service_rejects_other_kinds() {
        let sink = InMemoryIngestionSink::new();
        let service = IngestionServiceFactory::create(DataObjectKind::Advisory, &sink);
        let enrichment = CveEnrichment::from_record(json!({"cve_id": "CVE-2023-4863"})).unwrap();

        assert!(service
            .execute(vec![DataObject::CveEnrichment(enrichment)])
            .await
            .is_err());
    }
}
