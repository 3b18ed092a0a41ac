/// Crate-wide Result with anyhow::Error as the error type.
/// Typed errors (`SyncError`, `RecordError`) travel inside the anyhow chain.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
