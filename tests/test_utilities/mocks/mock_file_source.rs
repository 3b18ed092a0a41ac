use super::ManualClock;
use advisory_sync::ports::outbound::{RawRecords, RemoteFile};
use advisory_sync::prelude::*;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct MockFile {
    cursor: Cursor,
    lines: Vec<String>,
    download_secs: i64,
}

type Streams = HashMap<String, Vec<MockFile>>;

/// Mock FileSourceProvider serving in-memory files per stream
///
/// Streams are addressed by checkpoint slug, e.g. `advisories-v2-npm`.
#[derive(Clone, Default)]
pub struct MockFileSourceProvider {
    streams: Arc<Mutex<Streams>>,
    clock: Option<ManualClock>,
    opened: Arc<AtomicUsize>,
}

impl MockFileSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads move `clock` forward by the file's download time
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_file(self, slug: &str, sequence: u64, chunk: u64, lines: &[String]) -> Self {
        self.with_slow_file(slug, sequence, chunk, lines, 0)
    }

    pub fn with_slow_file(
        self,
        slug: &str,
        sequence: u64,
        chunk: u64,
        lines: &[String],
        download_secs: i64,
    ) -> Self {
        self.streams
            .lock()
            .unwrap()
            .entry(slug.to_string())
            .or_default()
            .push(MockFile {
                cursor: Cursor::new(sequence, chunk),
                lines: lines.to_vec(),
                download_secs,
            });
        self
    }

    pub fn opened_files(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

struct MockFileSource {
    files: Vec<MockFile>,
    clock: Option<ManualClock>,
    opened: Arc<AtomicUsize>,
}

#[async_trait]
impl FileSource for MockFileSource {
    fn data_after(&self, position: StreamPosition) -> BoxStream<'_, Result<RemoteFile>> {
        let mut files: Vec<RemoteFile> = self
            .files
            .iter()
            .filter(|file| position.admits(file.cursor))
            .map(|file| RemoteFile::new(file.cursor, format!("mock/{}", file.cursor)))
            .collect();
        files.sort_by_key(|file| file.cursor());
        stream::iter(files.into_iter().map(Ok)).boxed()
    }

    async fn open(&self, file: &RemoteFile) -> Result<RawRecords> {
        let mock = self
            .files
            .iter()
            .find(|mock| mock.cursor == file.cursor())
            .ok_or_else(|| anyhow::anyhow!("unknown file {}", file.location()))?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        if let Some(clock) = &self.clock {
            clock.advance_secs(mock.download_secs);
        }
        let lines: Vec<std::io::Result<String>> = mock.lines.iter().cloned().map(Ok).collect();
        Ok(Box::new(lines.into_iter()))
    }
}

impl FileSourceProvider for MockFileSourceProvider {
    fn source_for(&self, config: &SyncConfiguration) -> Result<Box<dyn FileSource>> {
        let files = self
            .streams
            .lock()
            .unwrap()
            .get(&config.checkpoint_key().slug())
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MockFileSource {
            files,
            clock: self.clock.clone(),
            opened: self.opened.clone(),
        }))
    }
}
