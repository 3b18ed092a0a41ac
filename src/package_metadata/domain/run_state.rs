use super::cursor::Cursor;
use serde::Serialize;

/// Throughput counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub configurations_processed: usize,
    pub files_processed: usize,
    pub batches_ingested: usize,
    pub objects_ingested: usize,
    pub records_rejected: usize,
}

/// Result of ingesting one file completely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSummary {
    pub cursor: Cursor,
    pub batches: usize,
    pub objects_ingested: usize,
    pub records_rejected: usize,
}

/// Accumulated state of one run.
///
/// Every transition consumes the state and returns the next one; nothing
/// mutates it in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    stats: SyncStats,
    last_cursor: Option<Cursor>,
    stop_observed: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file was ingested and its checkpoint written
    #[must_use]
    pub fn file_completed(self, summary: FileSummary) -> Self {
        Self {
            stats: SyncStats {
                files_processed: self.stats.files_processed + 1,
                batches_ingested: self.stats.batches_ingested + summary.batches,
                objects_ingested: self.stats.objects_ingested + summary.objects_ingested,
                records_rejected: self.stats.records_rejected + summary.records_rejected,
                ..self.stats
            },
            last_cursor: Some(summary.cursor),
            ..self
        }
    }

    /// A configuration's stream was drained or stopped
    #[must_use]
    pub fn configuration_completed(self) -> Self {
        Self {
            stats: SyncStats {
                configurations_processed: self.stats.configurations_processed + 1,
                ..self.stats
            },
            last_cursor: None,
            ..self
        }
    }

    /// The stop signal fired
    #[must_use]
    pub fn stopped(self) -> Self {
        Self {
            stop_observed: true,
            ..self
        }
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Cursor of the last file completed in the current configuration
    pub fn last_cursor(&self) -> Option<Cursor> {
        self.last_cursor
    }

    pub fn stop_observed(&self) -> bool {
        self.stop_observed
    }
}
