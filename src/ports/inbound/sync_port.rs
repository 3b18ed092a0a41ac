use crate::package_metadata::domain::{DataType, SyncStats};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Category of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad settings; nothing was read or written
    Configuration,
    /// The ingestion sink rejected a batch
    Ingestion,
    /// A file could not be listed or downloaded
    Source,
    /// The checkpoint or lease store failed
    State,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Ingestion => "ingestion",
            FailureKind::Source => "source",
            FailureKind::State => "state",
        };
        f.write_str(name)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Every configuration was drained
    Success,
    /// The stop signal fired; checkpoints written so far stand
    Stopped,
    /// Another worker holds the lease
    Skipped,
    Failed { kind: FailureKind, message: String },
}

impl SyncStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncStatus::Failed { .. })
    }
}

/// Response of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub data_type: DataType,
    #[serde(flatten)]
    pub status: SyncStatus,
    pub stats: SyncStats,
}

impl SyncReport {
    pub fn new(data_type: DataType, status: SyncStatus, stats: SyncStats) -> Self {
        Self {
            data_type,
            status,
            stats,
        }
    }
}

/// SyncPort - Inbound port for the package metadata sync use case
///
/// This is what a scheduler (or the CLI) calls. A run never returns an
/// error: every outcome, including failures, is described by the report.
#[async_trait]
pub trait SyncPort: Send + Sync {
    async fn run(&self, data_type: DataType) -> SyncReport;
}
