use crate::package_metadata::domain::{Cursor, StreamPosition, SyncConfiguration};
use crate::shared::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lines of one published file, read lazily.
///
/// An `Err` item is an I/O failure of the underlying file, not a bad record.
pub type RawRecords = Box<dyn Iterator<Item = std::io::Result<String>> + Send>;

/// Handle to one published file of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    cursor: Cursor,
    location: String,
}

impl RemoteFile {
    /// `location` is whatever the source needs to open the file again
    /// (an object name or a filesystem path)
    pub fn new(cursor: Cursor, location: String) -> Self {
        Self { cursor, location }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn sequence(&self) -> u64 {
        self.cursor.sequence()
    }

    pub fn chunk(&self) -> u64 {
        self.cursor.chunk()
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// FileSource port for enumerating and reading published files
///
/// Implementations read from a remote bucket or a local bundle; the
/// orchestrator does not know which.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Files strictly after `position`, in ascending `(sequence, chunk)` order.
    ///
    /// The sequence is lazy: listing pages are fetched as it is consumed.
    fn data_after(&self, position: StreamPosition) -> BoxStream<'_, Result<RemoteFile>>;

    /// Opens a file yielded by `data_after` and returns its lines
    async fn open(&self, file: &RemoteFile) -> Result<RawRecords>;
}

/// FileSourceProvider port for choosing a source per stream
pub trait FileSourceProvider: Send + Sync {
    /// Builds the source for one configuration.
    ///
    /// # Errors
    /// Returns a configuration error when the settings needed by the
    /// configuration's storage type are missing.
    fn source_for(&self, config: &SyncConfiguration) -> Result<Box<dyn FileSource>>;
}
