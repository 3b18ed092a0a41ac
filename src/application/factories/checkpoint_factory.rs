use crate::package_metadata::domain::{DataType, SyncConfiguration};
use crate::ports::outbound::{CheckpointStore, NullCheckpoint};

static NULL_CHECKPOINT: NullCheckpoint = NullCheckpoint;

/// Selects the checkpoint strategy of a stream
///
/// The CVE enrichment stream is re-read in full on every run, so it never
/// touches the durable store.
pub struct CheckpointFactory;

impl CheckpointFactory {
    pub fn for_configuration<'a>(
        config: &SyncConfiguration,
        store: &'a dyn CheckpointStore,
    ) -> &'a dyn CheckpointStore {
        match config.data_type() {
            DataType::CveEnrichment => &NULL_CHECKPOINT,
            DataType::Advisories | DataType::Licenses => store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryCheckpointStore;
    use crate::package_metadata::domain::{Cursor, PurlType, StorageType, StreamPosition, VersionFormat};

    #[tokio::test]
    async fn test_cve_enrichment_uses_null_checkpoint() {
        let durable = InMemoryCheckpointStore::new();
        let config = SyncConfiguration::new(
            DataType::CveEnrichment,
            VersionFormat::V2,
            None,
            StorageType::OfflineBundle,
        );

        let store = CheckpointFactory::for_configuration(&config, &durable);
        store
            .write(&config.checkpoint_key(), Cursor::new(3, 0))
            .await
            .unwrap();

        assert_eq!(
            store.read(&config.checkpoint_key()).await.unwrap(),
            StreamPosition::Start
        );
        assert!(durable.cursor(&config.checkpoint_key()).is_none());
    }

    #[tokio::test]
    async fn test_advisories_use_durable_store() {
        let durable = InMemoryCheckpointStore::new();
        let config = SyncConfiguration::new(
            DataType::Advisories,
            VersionFormat::V2,
            Some(PurlType::new("npm".to_string()).unwrap()),
            StorageType::OfflineBundle,
        );

        let store = CheckpointFactory::for_configuration(&config, &durable);
        store
            .write(&config.checkpoint_key(), Cursor::new(3, 0))
            .await
            .unwrap();

        assert_eq!(durable.cursor(&config.checkpoint_key()), Some(Cursor::new(3, 0)));
    }
}
