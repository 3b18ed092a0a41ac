/// Filesystem adapters: offline bundle source, state stores and sink
mod bundle_file_source;
mod file_checkpoint_store;
mod file_ingestion_sink;
mod file_lease_store;
mod json_document;

pub use bundle_file_source::BundleFileSource;
pub use file_checkpoint_store::FileCheckpointStore;
pub use file_ingestion_sink::FileIngestionSink;
pub use file_lease_store::FileLeaseStore;
