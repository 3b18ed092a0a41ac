/// Data Transfer Objects for application layer
///
/// Settings handed in by the CLI (or any other driver) to build and run
/// the sync use case.
mod storage_settings;
mod sync_settings;

pub use storage_settings::{BucketSettings, StorageSettings, DEFAULT_BUCKET_BASE_URL};
pub use sync_settings::{
    SyncSettings, DEFAULT_BATCH_SIZE, DEFAULT_LEASE_TTL, DEFAULT_MAX_RUN_DURATION,
    DEFAULT_PURL_TYPES, DEFAULT_THROTTLE,
};
