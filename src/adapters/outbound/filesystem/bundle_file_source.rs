use crate::package_metadata::domain::{Cursor, StreamPosition, SyncConfiguration};
use crate::ports::outbound::{FileSource, RawRecords, RemoteFile};
use crate::shared::error::SyncError;
use crate::shared::security::{open_regular_file, MAX_BUNDLE_FILE_SIZE};
use crate::shared::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// BundleFileSource adapter reading an unpacked offline bundle
///
/// Layout: `<bundle>/<data_type>/<version>[/<purl_type>]/<sequence>/<chunk>.<ext>`.
/// A stream directory that does not exist yet simply has no files.
pub struct BundleFileSource {
    stream_dir: PathBuf,
    extension: &'static str,
}

impl BundleFileSource {
    /// Creates the source for one stream of the bundle at `bundle_path`
    ///
    /// # Errors
    /// Returns a configuration error if `bundle_path` is not a directory.
    pub fn new(bundle_path: &Path, config: &SyncConfiguration) -> Result<Self> {
        if !bundle_path.is_dir() {
            return Err(SyncError::configuration(
                format!("offline bundle {} is not a directory", bundle_path.display()),
                "Point bundle_path (or --bundle-path) at an unpacked offline bundle",
            )
            .into());
        }

        Ok(Self {
            stream_dir: bundle_path
                .join(config.data_type().as_str())
                .join(config.file_prefix()),
            extension: config.file_extension(),
        })
    }

    fn source_error(&self, path: &Path, error: std::io::Error) -> anyhow::Error {
        SyncError::Source {
            location: path.display().to_string(),
            details: error.to_string(),
        }
        .into()
    }

    fn list_files(&self, position: StreamPosition) -> Result<Vec<RemoteFile>> {
        if !self.stream_dir.is_dir() {
            tracing::debug!(path = %self.stream_dir.display(), "stream directory absent, no files");
            return Ok(Vec::new());
        }

        let min_sequence = position.cursor().map(|c| c.sequence()).unwrap_or(0);
        let mut files = Vec::new();

        let entries =
            fs::read_dir(&self.stream_dir).map_err(|e| self.source_error(&self.stream_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| self.source_error(&self.stream_dir, e))?;
            let sequence_name = entry.file_name().to_string_lossy().into_owned();

            let is_dir = entry
                .file_type()
                .map_err(|e| self.source_error(&entry.path(), e))?
                .is_dir();
            let sequence = sequence_name.parse::<u64>().ok();
            let Some(sequence) = sequence.filter(|_| is_dir) else {
                tracing::warn!(name = %sequence_name, "ignoring entry outside the file layout");
                continue;
            };
            if sequence < min_sequence {
                continue;
            }

            let sequence_dir = entry.path();
            let chunks =
                fs::read_dir(&sequence_dir).map_err(|e| self.source_error(&sequence_dir, e))?;
            for chunk in chunks {
                let chunk = chunk.map_err(|e| self.source_error(&sequence_dir, e))?;
                let relative = format!("{}/{}", sequence_name, chunk.file_name().to_string_lossy());

                match Cursor::from_file_name(&relative, self.extension) {
                    Some(cursor) if position.admits(cursor) => files.push(RemoteFile::new(
                        cursor,
                        chunk.path().to_string_lossy().into_owned(),
                    )),
                    Some(_) => {}
                    None => {
                        tracing::warn!(name = %relative, "ignoring entry outside the file layout")
                    }
                }
            }
        }

        files.sort_by_key(|file| file.cursor());
        Ok(files)
    }
}

#[async_trait]
impl FileSource for BundleFileSource {
    fn data_after(&self, position: StreamPosition) -> BoxStream<'_, Result<RemoteFile>> {
        match self.list_files(position) {
            Ok(files) => stream::iter(files.into_iter().map(Ok)).boxed(),
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        }
    }

    async fn open(&self, file: &RemoteFile) -> Result<RawRecords> {
        let path = Path::new(file.location());
        let handle = open_regular_file(path, "offline bundle", MAX_BUNDLE_FILE_SIZE).map_err(|e| {
            SyncError::Source {
                location: file.location().to_string(),
                details: e.to_string(),
            }
        })?;
        Ok(Box::new(BufReader::new(handle).lines()))
    }
}
