use super::{dedup_last_wins, ingestion_error, narrow, IngestionService};
use crate::package_metadata::domain::{DataObject, DataObjectKind};
use crate::ports::outbound::IngestionSink;
use crate::shared::Result;
use async_trait::async_trait;

/// Upserts advisories together with their affected packages
pub struct AdvisoryIngestionService<'a> {
    sink: &'a dyn IngestionSink,
}

impl<'a> AdvisoryIngestionService<'a> {
    pub fn new(sink: &'a dyn IngestionSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl IngestionService for AdvisoryIngestionService<'_> {
    async fn execute(&self, batch: Vec<DataObject>) -> Result<usize> {
        let advisories = narrow(batch, DataObjectKind::Advisory, DataObject::into_advisory)?;
        let advisories = dedup_last_wins(advisories, |advisory| {
            let (source_xid, advisory_xid) = advisory.identity();
            (source_xid.to_string(), advisory_xid.to_string())
        });
        if advisories.is_empty() {
            return Ok(0);
        }

        self.sink
            .upsert_advisories(&advisories)
            .await
            .map_err(|e| ingestion_error(DataObjectKind::Advisory, e))
    }
}
