use crate::package_metadata::domain::{CheckpointKey, Cursor, StreamPosition};
use crate::ports::outbound::CheckpointStore;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process CheckpointStore
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    cursors: DashMap<CheckpointKey, Cursor>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a cursor, as an operator would
    pub fn with_cursor(self, key: CheckpointKey, cursor: Cursor) -> Self {
        self.cursors.insert(key, cursor);
        self
    }

    pub fn cursor(&self, key: &CheckpointKey) -> Option<Cursor> {
        self.cursors.get(key).map(|entry| *entry.value())
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn read(&self, key: &CheckpointKey) -> Result<StreamPosition> {
        Ok(self.cursor(key).into())
    }

    async fn write(&self, key: &CheckpointKey, cursor: Cursor) -> Result<()> {
        self.cursors.insert(key.clone(), cursor);
        Ok(())
    }
}
