/// Use cases module containing application business logic orchestration
mod sync_package_metadata;

pub use sync_package_metadata::SyncPackageMetadataUseCase;
