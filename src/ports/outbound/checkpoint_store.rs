use crate::package_metadata::domain::{CheckpointKey, Cursor, StreamPosition};
use crate::shared::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// CheckpointStore port for durable stream cursors
///
/// Only one worker holds the lease for a key at a time, so last-writer-wins
/// is sufficient; a write must still never be observed half-done.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Reads the position of a stream.
    ///
    /// A key that was never written reads as [`StreamPosition::Start`].
    async fn read(&self, key: &CheckpointKey) -> Result<StreamPosition>;

    /// Records that every file up to and including `cursor` is ingested
    async fn write(&self, key: &CheckpointKey, cursor: Cursor) -> Result<()>;
}

/// Checkpoint strategy for streams that are always read in full
///
/// Reads start-of-stream and ignores writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCheckpoint;

#[async_trait]
impl CheckpointStore for NullCheckpoint {
    async fn read(&self, _key: &CheckpointKey) -> Result<StreamPosition> {
        Ok(StreamPosition::Start)
    }

    async fn write(&self, _key: &CheckpointKey, _cursor: Cursor) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: CheckpointStore + ?Sized> CheckpointStore for Arc<T> {
    async fn read(&self, key: &CheckpointKey) -> Result<StreamPosition> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CheckpointKey, cursor: Cursor) -> Result<()> {
        (**self).write(key, cursor).await
    }
}
