/// Package metadata sync core: domain objects, policies and the services
/// that fabricate, batch and time-box ingestion.
pub mod domain;
pub mod policies;
pub mod services;
