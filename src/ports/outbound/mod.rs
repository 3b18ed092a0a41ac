/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the sync core uses to reach
/// published files, durable state, storage and telemetry.
pub mod checkpoint_store;
pub mod clock;
pub mod file_source;
pub mod ingestion_sink;
pub mod lease_store;
pub mod telemetry;

pub use checkpoint_store::{CheckpointStore, NullCheckpoint};
pub use clock::Clock;
pub use file_source::{FileSource, FileSourceProvider, RawRecords, RemoteFile};
pub use ingestion_sink::{IngestionSink, PackageVersionLicenses};
pub use lease_store::{Lease, LeaseAcquisition, LeaseStore};
pub use telemetry::Telemetry;
