mod checkpoint_factory;
mod connector_factory;
mod ingestion_service_factory;

pub use checkpoint_factory::CheckpointFactory;
pub use connector_factory::ConnectorFactory;
pub use ingestion_service_factory::IngestionServiceFactory;
