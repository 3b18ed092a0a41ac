/// Ingestion services, one per data object kind
///
/// Each service takes a batch of fabricated objects, narrows it to the
/// variant it handles, collapses duplicate identities and upserts the
/// result through the [`IngestionSink`](crate::ports::outbound::IngestionSink).
mod advisory_ingestion;
mod compressed_package_ingestion;
mod cve_enrichment_ingestion;
mod license_record_ingestion;

pub use advisory_ingestion::AdvisoryIngestionService;
pub use compressed_package_ingestion::CompressedPackageIngestionService;
pub use cve_enrichment_ingestion::CveEnrichmentIngestionService;
pub use license_record_ingestion::LicenseRecordIngestionService;

use crate::package_metadata::domain::{DataObject, DataObjectKind};
use crate::shared::error::SyncError;
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;

/// IngestionService - idempotent upsert of one batch
#[async_trait]
pub trait IngestionService: Send + Sync {
    /// Writes `batch` and returns the number of objects written
    ///
    /// # Errors
    /// Storage failures and objects of the wrong kind abort the batch.
    async fn execute(&self, batch: Vec<DataObject>) -> Result<usize>;
}

/// Unwraps every object of a batch into the variant a service handles
fn narrow<T>(
    batch: Vec<DataObject>,
    expected: DataObjectKind,
    unwrap: fn(DataObject) -> Option<T>,
) -> Result<Vec<T>> {
    batch
        .into_iter()
        .map(|object| {
            let found = object.kind();
            unwrap(object).ok_or_else(|| {
                SyncError::UnexpectedDataObject {
                    expected: expected.to_string(),
                    found: found.to_string(),
                }
                .into()
            })
        })
        .collect()
}

/// Keeps one item per key: the last occurrence, at the first occurrence's position
fn dedup_last_wins<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        match positions.get(&key(&item)) {
            Some(&index) => unique[index] = item,
            None => {
                positions.insert(key(&item), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

/// Wraps a sink failure so the run reports it as an ingestion failure
fn ingestion_error(kind: DataObjectKind, error: anyhow::Error) -> anyhow::Error {
    SyncError::Ingestion {
        kind: kind.to_string(),
        details: format!("{:#}", error),
    }
    .into()
}
