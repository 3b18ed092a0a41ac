use super::{dedup_last_wins, ingestion_error, narrow, IngestionService};
use crate::package_metadata::domain::{DataObject, DataObjectKind};
use crate::ports::outbound::IngestionSink;
use crate::shared::Result;
use async_trait::async_trait;

/// Upserts EPSS scores and known-exploit flags by CVE id
pub struct CveEnrichmentIngestionService<'a> {
    sink: &'a dyn IngestionSink,
}

impl<'a> CveEnrichmentIngestionService<'a> {
    pub fn new(sink: &'a dyn IngestionSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl IngestionService for CveEnrichmentIngestionService<'_> {
    async fn execute(&self, batch: Vec<DataObject>) -> Result<usize> {
        let enrichments = narrow(batch, DataObjectKind::CveEnrichment, DataObject::into_cve_enrichment)?;
        let enrichments = dedup_last_wins(enrichments, |e| e.cve_id().to_string());
        if enrichments.is_empty() {
            return Ok(0);
        }

        self.sink
            .upsert_cve_enrichments(&enrichments)
            .await
            .map_err(|e| ingestion_error(DataObjectKind::CveEnrichment, e))
    }
}
