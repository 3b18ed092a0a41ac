//! advisory-sync - resumable ingestion of published package metadata
//!
//! This library keeps a store of advisories, package licenses and CVE
//! enrichment in step with datasets published as numbered files, following
//! hexagonal architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`package_metadata`): Data objects, cursors, run state,
//!   the record fabricator and the stop signal
//! - **Application Layer** (`application`): The sync use case, ingestion
//!   services and factories
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use advisory_sync::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let storage = StorageSettings {
//!     bundle_path: Some("./bundle".into()),
//!     ..StorageSettings::default()
//! };
//!
//! let use_case = SyncPackageMetadataUseCase::new(
//!     ConnectorFactory::new(storage),
//!     FileCheckpointStore::new(Path::new("./state")),
//!     FileLeaseStore::new(Path::new("./state"), clock.clone()),
//!     FileIngestionSink::new(Path::new("./sink")),
//!     TracingTelemetry::new(),
//!     clock,
//!     SyncSettings::default(),
//! );
//!
//! let report = use_case.execute(DataType::Advisories).await;
//! println!("{}", serde_json::to_string(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod package_metadata;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::TracingTelemetry;
    pub use crate::adapters::outbound::filesystem::{
        BundleFileSource, FileCheckpointStore, FileIngestionSink, FileLeaseStore,
    };
    pub use crate::adapters::outbound::memory::{
        InMemoryCheckpointStore, InMemoryIngestionSink, InMemoryLeaseStore,
    };
    pub use crate::adapters::outbound::network::BucketFileSource;
    pub use crate::adapters::outbound::SystemClock;
    pub use crate::application::dto::{BucketSettings, StorageSettings, SyncSettings};
    pub use crate::application::factories::ConnectorFactory;
    pub use crate::application::use_cases::SyncPackageMetadataUseCase;
    pub use crate::package_metadata::domain::{
        Advisory, CompressedPackage, CveEnrichment, Cursor, DataObject, DataType, LicenseRecord,
        PurlType, StorageType, StreamPosition, SyncConfiguration, VersionFormat,
    };
    pub use crate::ports::inbound::{FailureKind, SyncPort, SyncReport, SyncStatus};
    pub use crate::ports::outbound::{
        CheckpointStore, Clock, FileSource, FileSourceProvider, IngestionSink, LeaseStore,
        Telemetry,
    };
    pub use crate::shared::Result;
}
