use crate::application::dto::SyncSettings;
use crate::application::factories::{CheckpointFactory, IngestionServiceFactory};
use crate::application::ingestion::IngestionService;
use crate::package_metadata::domain::{
    DataObjectKind, DataType, FileSummary, RunState, SyncConfiguration,
};
use crate::package_metadata::services::{Batches, DataObjectFabricator, StopSignal};
use crate::ports::inbound::{FailureKind, SyncPort, SyncReport, SyncStatus};
use crate::ports::outbound::{
    CheckpointStore, Clock, FileSource, FileSourceProvider, IngestionSink, Lease,
    LeaseAcquisition, LeaseStore, RemoteFile, Telemetry,
};
use crate::shared::error::SyncError;
use crate::shared::Result;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

/// A stream together with the connector that reads it
type Stream = (SyncConfiguration, Box<dyn FileSource>);

/// A run or stream cut short by an error, with the progress made before it
type Interrupted = (RunState, anyhow::Error);

/// How a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEnd {
    Completed,
    Stopped,
    Skipped,
}

/// How one configuration's stream ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    Drained,
    Stopped,
}

/// SyncPackageMetadataUseCase - resumable, lease-guarded sync of one data type
///
/// One run works sequentially through every configuration of the requested
/// data type: for each, it reads the checkpoint, pulls the files published
/// after it, fabricates and ingests their records batch by batch, and moves
/// the checkpoint forward after each completed file.
///
/// # Type Parameters
/// * `P` - FileSourceProvider implementation
/// * `C` - CheckpointStore implementation
/// * `L` - LeaseStore implementation
/// * `S` - IngestionSink implementation
/// * `T` - Telemetry implementation
pub struct SyncPackageMetadataUseCase<P, C, L, S, T> {
    sources: P,
    checkpoints: C,
    leases: L,
    sink: S,
    telemetry: T,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
}

impl<P, C, L, S, T> SyncPackageMetadataUseCase<P, C, L, S, T>
where
    P: FileSourceProvider,
    C: CheckpointStore,
    L: LeaseStore,
    S: IngestionSink,
    T: Telemetry,
{
    /// Creates a new SyncPackageMetadataUseCase with injected dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sources: P,
        checkpoints: C,
        leases: L,
        sink: S,
        telemetry: T,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            sources,
            checkpoints,
            leases,
            sink,
            telemetry,
            clock,
            settings,
        }
    }

    /// Runs one sync of `data_type` and reports how it ended
    ///
    /// Never returns an error: failures are classified into the report.
    pub async fn execute(&self, data_type: DataType) -> SyncReport {
        self.telemetry
            .record_log("sync_started", &[("data_type", data_type.to_string())]);

        let (state, status) = match self.try_run(data_type).await {
            Ok((state, RunEnd::Completed)) => (state, SyncStatus::Success),
            Ok((state, RunEnd::Stopped)) => (state, SyncStatus::Stopped),
            Ok((state, RunEnd::Skipped)) => (state, SyncStatus::Skipped),
            Err((state, error)) => (
                state,
                SyncStatus::Failed {
                    kind: classify(&error),
                    message: format!("{:#}", error),
                },
            ),
        };

        let stats = state.stats();
        self.telemetry.record_log(
            "sync_finished",
            &[
                ("data_type", data_type.to_string()),
                ("status", status_name(&status).to_string()),
                ("files", stats.files_processed.to_string()),
                ("objects", stats.objects_ingested.to_string()),
                ("rejected", stats.records_rejected.to_string()),
            ],
        );
        SyncReport::new(data_type, status, stats)
    }

    /// Builds every stream up front, so that configuration errors surface
    /// before any shared state is touched
    fn prepare(&self, data_type: DataType) -> Result<Vec<Stream>> {
        self.settings
            .resolve_configurations(data_type)?
            .into_iter()
            .map(|config| {
                let source = self.sources.source_for(&config)?;
                Ok((config, source))
            })
            .collect()
    }

    async fn try_run(
        &self,
        data_type: DataType,
    ) -> std::result::Result<(RunState, RunEnd), Interrupted> {
        let streams = self.prepare(data_type).map_err(|e| (RunState::new(), e))?;

        let lease_key = self.settings.lease_key(data_type);
        let acquisition = self
            .leases
            .try_acquire(&lease_key, self.settings.lease_ttl)
            .await
            .map_err(|e| (RunState::new(), e))?;
        let lease = match acquisition {
            LeaseAcquisition::Acquired(lease) => {
                self.telemetry.record_log(
                    "lease_acquired",
                    &[("key", lease_key), ("expires_at", lease.expires_at().to_rfc3339())],
                );
                lease
            }
            LeaseAcquisition::Busy => {
                self.telemetry
                    .record_log("lease_busy", &[("key", lease_key)]);
                return Ok((RunState::new(), RunEnd::Skipped));
            }
        };

        let outcome = self.run_with_lease(&lease, &streams).await;

        // An unreleased lease still expires after its TTL
        if let Err(e) = self.leases.release(&lease).await {
            self.telemetry.record_log(
                "lease_release_failed",
                &[("key", lease.key().to_string()), ("error", format!("{:#}", e))],
            );
        }

        outcome
    }

    async fn run_with_lease(
        &self,
        lease: &Lease,
        streams: &[Stream],
    ) -> std::result::Result<(RunState, RunEnd), Interrupted> {
        let stop = StopSignal::new(
            lease,
            self.settings.lease_ttl,
            self.settings.max_run_duration,
            self.clock.clone(),
        )
        .map_err(|e| (RunState::new(), e))?;

        let mut state = RunState::new();
        for (config, source) in streams {
            if stop.should_stop() {
                self.record_stop(config);
                return Ok((state.stopped(), RunEnd::Stopped));
            }

            let (next, end) = self.sync_stream(config, source.as_ref(), &stop, state).await?;
            state = next;
            if end == StreamEnd::Stopped {
                return Ok((state.stopped(), RunEnd::Stopped));
            }
            state = state.configuration_completed();
        }

        Ok((state, RunEnd::Completed))
    }

    async fn sync_stream(
        &self,
        config: &SyncConfiguration,
        source: &dyn FileSource,
        stop: &StopSignal,
        state: RunState,
    ) -> std::result::Result<(RunState, StreamEnd), Interrupted> {
        let checkpoints = CheckpointFactory::for_configuration(config, &self.checkpoints);
        let key = config.checkpoint_key();
        let position = checkpoints.read(&key).await.map_err(|e| (state, e))?;

        self.telemetry.record_log(
            "stream_started",
            &[("stream", config.to_string()), ("after", position.to_string())],
        );

        let service = IngestionServiceFactory::create(DataObjectKind::for_config(config), &self.sink);
        let mut files = source.data_after(position);
        let mut state = state;

        while let Some(file) = files.next().await {
            let file = file.map_err(|e| (state, e))?;
            let summary = self
                .sync_file(config, source, service.as_ref(), &file)
                .await
                .map_err(|e| (state, e))?;
            checkpoints
                .write(&key, file.cursor())
                .await
                .map_err(|e| (state, e))?;
            state = state.file_completed(summary);

            self.telemetry.record_log(
                "file_ingested",
                &[
                    ("stream", key.to_string()),
                    ("cursor", file.cursor().to_string()),
                    ("objects", summary.objects_ingested.to_string()),
                    ("rejected", summary.records_rejected.to_string()),
                ],
            );

            if stop.should_stop() {
                self.record_stop(config);
                return Ok((state, StreamEnd::Stopped));
            }
        }

        Ok((state, StreamEnd::Drained))
    }

    /// Ingests one file completely; the caller moves the checkpoint
    async fn sync_file(
        &self,
        config: &SyncConfiguration,
        source: &dyn FileSource,
        service: &dyn IngestionService,
        file: &RemoteFile,
    ) -> Result<FileSummary> {
        let lines = source.open(file).await?;
        let fabricator = DataObjectFabricator::new(lines, config, &self.telemetry)?;
        let mut batches = Batches::new(fabricator, self.settings.batch_size);

        let mut batch_count = 0;
        let mut objects_ingested = 0;
        for batch in batches.by_ref() {
            let batch = batch.map_err(|e| SyncError::Source {
                location: file.location().to_string(),
                details: format!("{:#}", e),
            })?;

            // Throttle between batches, not after the last one
            if batch_count > 0 && !self.settings.throttle.is_zero() {
                tokio::time::sleep(self.settings.throttle).await;
            }
            objects_ingested += service.execute(batch).await?;
            batch_count += 1;
        }

        Ok(FileSummary {
            cursor: file.cursor(),
            batches: batch_count,
            objects_ingested,
            records_rejected: batches.inner().rejected(),
        })
    }

    fn record_stop(&self, config: &SyncConfiguration) {
        self.telemetry
            .record_log("stop_observed", &[("stream", config.to_string())]);
    }
}

#[async_trait]
impl<P, C, L, S, T> SyncPort for SyncPackageMetadataUseCase<P, C, L, S, T>
where
    P: FileSourceProvider,
    C: CheckpointStore,
    L: LeaseStore,
    S: IngestionSink,
    T: Telemetry,
{
    async fn run(&self, data_type: DataType) -> SyncReport {
        self.execute(data_type).await
    }
}

/// Maps an error to the failure kind of the report by the first typed
/// error in its chain
fn classify(error: &anyhow::Error) -> FailureKind {
    let typed = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<SyncError>());

    match typed {
        Some(SyncError::Configuration { .. }) | Some(SyncError::UnsupportedStorageType { .. }) => {
            FailureKind::Configuration
        }
        Some(SyncError::Source { .. }) => FailureKind::Source,
        Some(SyncError::Checkpoint { .. }) | Some(SyncError::Lease { .. }) => FailureKind::State,
        Some(SyncError::Ingestion { .. }) | Some(SyncError::UnexpectedDataObject { .. }) | None => {
            FailureKind::Ingestion
        }
    }
}

fn status_name(status: &SyncStatus) -> &'static str {
    match status {
        SyncStatus::Success => "success",
        SyncStatus::Stopped => "stopped",
        SyncStatus::Skipped => "skipped",
        SyncStatus::Failed { .. } => "failed",
    }
}

#[cfg(test)]
mod tests;
