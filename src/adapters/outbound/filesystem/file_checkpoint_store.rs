use super::json_document::{read_document, write_document};
use crate::package_metadata::domain::{CheckpointKey, Cursor, StreamPosition};
use crate::ports::outbound::CheckpointStore;
use crate::shared::error::SyncError;
use crate::shared::security::MAX_STATE_FILE_SIZE;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointDocument {
    sequence: u64,
    chunk: u64,
    updated_at: DateTime<Utc>,
}

/// FileCheckpointStore adapter keeping one JSON document per stream
///
/// Documents live at `<state_dir>/checkpoints/<key slug>.json` and are
/// replaced atomically on every write.
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.join("checkpoints"),
        }
    }

    fn path_for(&self, key: &CheckpointKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.slug()))
    }

    fn state_error(key: &CheckpointKey, error: anyhow::Error) -> anyhow::Error {
        SyncError::Checkpoint {
            key: key.slug(),
            details: format!("{:#}", error),
        }
        .into()
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn read(&self, key: &CheckpointKey) -> Result<StreamPosition> {
        let document: Option<CheckpointDocument> =
            read_document(&self.path_for(key), MAX_STATE_FILE_SIZE)
                .map_err(|e| Self::state_error(key, e))?;
        Ok(document
            .map(|doc| Cursor::new(doc.sequence, doc.chunk))
            .into())
    }

    async fn write(&self, key: &CheckpointKey, cursor: Cursor) -> Result<()> {
        let document = CheckpointDocument {
            sequence: cursor.sequence(),
            chunk: cursor.chunk(),
            updated_at: Utc::now(),
        };
        write_document(&self.path_for(key), &document).map_err(|e| Self::state_error(key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_metadata::domain::{DataType, PurlType, VersionFormat};
    use tempfile::TempDir;

    fn key(purl: &str) -> CheckpointKey {
        CheckpointKey {
            data_type: DataType::Licenses,
            version_format: VersionFormat::V2,
            purl_type: Some(PurlType::new(purl.to_string()).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_unseen_key_reads_start() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert_eq!(store.read(&key("npm")).await.unwrap(), StreamPosition::Start);
    }

    #[tokio::test]
    async fn test_write_is_visible_to_new_store() {
        let dir = TempDir::new().unwrap();
        FileCheckpointStore::new(dir.path())
            .write(&key("npm"), Cursor::new(6, 0))
            .await
            .unwrap();

        let reopened = FileCheckpointStore::new(dir.path());
        assert_eq!(
            reopened.read(&key("npm")).await.unwrap(),
            StreamPosition::After(Cursor::new(6, 0))
        );
        assert_eq!(reopened.read(&key("gem")).await.unwrap(), StreamPosition::Start);
        assert!(dir.path().join("checkpoints/licenses-v2-npm.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_state_error() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("checkpoints")).unwrap();
        std::fs::write(dir.path().join("checkpoints/licenses-v2-npm.json"), "garbage").unwrap();

        let err = store.read(&key("npm")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::Checkpoint { .. })
        ));
    }
}
