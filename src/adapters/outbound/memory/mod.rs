/// In-process adapters for state and storage
mod in_memory_checkpoint_store;
mod in_memory_ingestion_sink;
mod in_memory_lease_store;

pub use in_memory_checkpoint_store::InMemoryCheckpointStore;
pub use in_memory_ingestion_sink::InMemoryIngestionSink;
pub use in_memory_lease_store::InMemoryLeaseStore;
