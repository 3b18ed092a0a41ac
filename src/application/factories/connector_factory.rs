use crate::adapters::outbound::filesystem::BundleFileSource;
use crate::adapters::outbound::network::BucketFileSource;
use crate::application::dto::StorageSettings;
use crate::package_metadata::domain::{StorageType, SyncConfiguration};
use crate::ports::outbound::{FileSource, FileSourceProvider};
use crate::shared::error::SyncError;
use crate::shared::Result;

/// Factory for creating file sources
///
/// The connector is a pure function of the configuration's storage type;
/// missing storage settings are configuration errors.
pub struct ConnectorFactory {
    storage: StorageSettings,
}

impl ConnectorFactory {
    pub fn new(storage: StorageSettings) -> Self {
        Self { storage }
    }

    fn bucket_source(&self, config: &SyncConfiguration) -> Result<Box<dyn FileSource>> {
        let data_type = config.data_type();
        let bucket = self.storage.bucket.bucket_for(data_type).ok_or_else(|| {
            SyncError::configuration(
                format!("no bucket configured for {}", data_type),
                format!("Set bucket.{} in the config file", data_type),
            )
        })?;
        Ok(Box::new(BucketFileSource::new(
            &self.storage.bucket.base_url,
            bucket,
            config,
        )?))
    }

    fn bundle_source(&self, config: &SyncConfiguration) -> Result<Box<dyn FileSource>> {
        let bundle_path = self.storage.bundle_path.as_deref().ok_or_else(|| {
            SyncError::configuration(
                "offline_bundle storage needs a bundle path",
                "Set bundle_path in the config file or pass --bundle-path",
            )
        })?;
        Ok(Box::new(BundleFileSource::new(bundle_path, config)?))
    }
}

impl FileSourceProvider for ConnectorFactory {
    fn source_for(&self, config: &SyncConfiguration) -> Result<Box<dyn FileSource>> {
        match config.storage_type() {
            StorageType::RemoteBucket => self.bucket_source(config),
            StorageType::OfflineBundle => self.bundle_source(config),
        }
    }
}
