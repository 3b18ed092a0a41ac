use super::*;
use crate::adapters::outbound::memory::{
    InMemoryCheckpointStore, InMemoryIngestionSink, InMemoryLeaseStore,
};
use crate::package_metadata::domain::{
    Advisory, CompressedPackage, CveEnrichment, Cursor, PurlType, StorageType, StreamPosition,
    VersionFormat,
};
use crate::ports::outbound::{PackageVersionLicenses, RawRecords};
use crate::shared::error::RecordError;
use chrono::{DateTime, TimeDelta, Utc};
use futures::stream::{self, BoxStream};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

// Mock implementations for testing
struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    fn advance(&self, seconds: i64) {
        let mut now = self.now.lock().unwrap();
        *now += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Clone)]
struct StubFile {
    cursor: Cursor,
    lines: Vec<String>,
    /// Seconds the clock moves forward while the file is downloaded
    download_secs: i64,
}

impl StubFile {
    fn new(sequence: u64, chunk: u64, lines: Vec<String>) -> Self {
        Self {
            cursor: Cursor::new(sequence, chunk),
            lines,
            download_secs: 0,
        }
    }

    fn slow(mut self, seconds: i64) -> Self {
        self.download_secs = seconds;
        self
    }
}

struct StubFileSource {
    files: Vec<StubFile>,
    clock: Arc<ManualClock>,
}

#[async_trait]
impl FileSource for StubFileSource {
    fn data_after(&self, position: StreamPosition) -> BoxStream<'_, Result<RemoteFile>> {
        let mut files: Vec<RemoteFile> = self
            .files
            .iter()
            .filter(|file| position.admits(file.cursor))
            .map(|file| RemoteFile::new(file.cursor, format!("stub/{}", file.cursor)))
            .collect();
        files.sort_by_key(|file| file.cursor());
        stream::iter(files.into_iter().map(Ok)).boxed()
    }

    async fn open(&self, file: &RemoteFile) -> Result<RawRecords> {
        let stub = self
            .files
            .iter()
            .find(|stub| stub.cursor == file.cursor())
            .ok_or_else(|| anyhow::anyhow!("no such file {}", file.location()))?;
        self.clock.advance(stub.download_secs);
        let lines: Vec<std::io::Result<String>> = stub.lines.iter().cloned().map(Ok).collect();
        Ok(Box::new(lines.into_iter()))
    }
}

/// Files per checkpoint slug
struct StubSources {
    streams: HashMap<String, Vec<StubFile>>,
    clock: Arc<ManualClock>,
}

impl StubSources {
    fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            streams: HashMap::new(),
            clock,
        }
    }

    fn with_stream(mut self, slug: &str, files: Vec<StubFile>) -> Self {
        self.streams.insert(slug.to_string(), files);
        self
    }
}

impl FileSourceProvider for StubSources {
    fn source_for(&self, config: &SyncConfiguration) -> Result<Box<dyn FileSource>> {
        let files = self
            .streams
            .get(&config.checkpoint_key().slug())
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(StubFileSource {
            files,
            clock: self.clock.clone(),
        }))
    }
}

#[derive(Default)]
struct RecordingTelemetry {
    failures: Mutex<Vec<RecordError>>,
    events: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    fn saw(&self, event: &str) -> bool {
        self.events.lock().unwrap().iter().any(|e| e == event)
    }
}

impl Telemetry for RecordingTelemetry {
    fn record_parse_failure(&self, error: &RecordError, _raw_record: &Value) {
        self.failures.lock().unwrap().push(error.clone());
    }

    fn record_log(&self, event: &str, _fields: &[(&str, String)]) {
        self.events.lock().unwrap().push(event.to_string());
    }
}

struct UnavailableSink;

#[async_trait]
impl IngestionSink for UnavailableSink {
    async fn upsert_advisories(&self, _advisories: &[Advisory]) -> Result<usize> {
        anyhow::bail!("connection refused")
    }

    async fn upsert_packages(&self, _packages: &[CompressedPackage]) -> Result<usize> {
        anyhow::bail!("connection refused")
    }

    async fn upsert_package_versions(&self, _rows: &[PackageVersionLicenses]) -> Result<usize> {
        anyhow::bail!("connection refused")
    }

    async fn upsert_cve_enrichments(&self, _enrichments: &[CveEnrichment]) -> Result<usize> {
        anyhow::bail!("connection refused")
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    checkpoints: Arc<InMemoryCheckpointStore>,
    leases: Arc<InMemoryLeaseStore>,
    sink: Arc<InMemoryIngestionSink>,
    telemetry: Arc<RecordingTelemetry>,
}

impl Harness {
    fn new() -> Self {
        Self::with_checkpoints(InMemoryCheckpointStore::new())
    }

    fn with_checkpoints(checkpoints: InMemoryCheckpointStore) -> Self {
        let clock = Arc::new(ManualClock::new());
        Self {
            leases: Arc::new(InMemoryLeaseStore::new(clock.clone())),
            clock,
            checkpoints: Arc::new(checkpoints),
            sink: Arc::new(InMemoryIngestionSink::new()),
            telemetry: Arc::new(RecordingTelemetry::default()),
        }
    }

    fn use_case(
        &self,
        sources: StubSources,
        settings: SyncSettings,
    ) -> SyncPackageMetadataUseCase<
        StubSources,
        Arc<InMemoryCheckpointStore>,
        Arc<InMemoryLeaseStore>,
        Arc<InMemoryIngestionSink>,
        Arc<RecordingTelemetry>,
    > {
        SyncPackageMetadataUseCase::new(
            sources,
            self.checkpoints.clone(),
            self.leases.clone(),
            self.sink.clone(),
            self.telemetry.clone(),
            self.clock.clone(),
            settings,
        )
    }

    fn sources(&self) -> StubSources {
        StubSources::new(self.clock.clone())
    }
}

fn settings(purl_types: &[&str]) -> SyncSettings {
    SyncSettings {
        purl_types: purl_types.iter().map(|p| p.to_string()).collect(),
        throttle: Duration::ZERO,
        ..SyncSettings::default()
    }
}

fn npm_key() -> crate::package_metadata::domain::CheckpointKey {
    SyncConfiguration::new(
        DataType::Advisories,
        VersionFormat::V2,
        Some(PurlType::new("npm".to_string()).unwrap()),
        StorageType::OfflineBundle,
    )
    .checkpoint_key()
}

fn advisory(id: &str, source: &str) -> String {
    json!({
        "advisory": {"id": id, "source": source, "title": "Prototype pollution"},
        "packages": [{"name": "lodash", "affected_range": "<4.17.21"}]
    })
    .to_string()
}

#[tokio::test]
async fn test_resumes_after_checkpoint() {
    let harness = Harness::with_checkpoints(
        InMemoryCheckpointStore::new().with_cursor(npm_key(), Cursor::new(5, 0)),
    );
    let sources = harness.sources().with_stream(
        "advisories-v2-npm",
        vec![
            StubFile::new(4, 0, vec![advisory("old-4", "glad")]),
            StubFile::new(5, 0, vec![advisory("old-5", "glad")]),
            StubFile::new(5, 1, vec![advisory("a-51", "glad")]),
            StubFile::new(6, 0, vec![advisory("a-60", "glad"), advisory("a-61", "trivy-db")]),
        ],
    );

    let report = harness.use_case(sources, settings(&["npm"])).execute(DataType::Advisories).await;

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.stats.files_processed, 2);
    assert_eq!(report.stats.objects_ingested, 3);
    assert_eq!(report.stats.configurations_processed, 1);
    assert_eq!(harness.sink.advisory_count(), 3);
    assert!(harness.sink.advisory("glad", "old-5").is_none());
    assert_eq!(harness.checkpoints.cursor(&npm_key()), Some(Cursor::new(6, 0)));
}

#[tokio::test]
async fn test_rejected_records_do_not_abort_file() {
    let harness = Harness::new();
    let sources = harness.sources().with_stream(
        "advisories-v2-npm",
        vec![StubFile::new(
            1,
            0,
            vec![
                advisory("a-1", "glad"),
                advisory("a-2", "unknown_source"),
                "{not json".to_string(),
                advisory("a-3", "trivy-db"),
            ],
        )],
    );

    let report = harness.use_case(sources, settings(&["npm"])).execute(DataType::Advisories).await;

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.stats.objects_ingested, 2);
    assert_eq!(report.stats.records_rejected, 2);
    assert_eq!(harness.telemetry.failures.lock().unwrap().len(), 2);
    assert_eq!(harness.checkpoints.cursor(&npm_key()), Some(Cursor::new(1, 0)));
}

#[tokio::test]
async fn test_second_run_ingests_nothing_new() {
    let harness = Harness::new();
    let files = vec![
        StubFile::new(1, 0, vec![advisory("a-1", "glad")]),
        StubFile::new(2, 0, vec![advisory("a-2", "glad")]),
    ];

    let first = harness
        .use_case(harness.sources().with_stream("advisories-v2-npm", files.clone()), settings(&["npm"]))
        .execute(DataType::Advisories)
        .await;
    let calls_after_first = harness.sink.upsert_calls();
    let second = harness
        .use_case(harness.sources().with_stream("advisories-v2-npm", files), settings(&["npm"]))
        .execute(DataType::Advisories)
        .await;

    assert_eq!(first.stats.files_processed, 2);
    assert_eq!(second.status, SyncStatus::Success);
    assert_eq!(second.stats.files_processed, 0);
    assert_eq!(harness.sink.upsert_calls(), calls_after_first);
    assert_eq!(harness.sink.advisory_count(), 2);
}

#[tokio::test]
async fn test_cve_enrichment_rereads_full_stream() {
    let harness = Harness::new();
    let line = json!({"cve_id": "CVE-2023-4863", "epss_score": 0.9, "is_known_exploit": true}).to_string();
    let files = vec![StubFile::new(1, 0, vec![line])];
    let settings = settings(&[]);

    for _ in 0..2 {
        let report = harness
            .use_case(
                harness.sources().with_stream("cve_enrichment-v2", files.clone()),
                settings.clone(),
            )
            .execute(DataType::CveEnrichment)
            .await;
        assert_eq!(report.status, SyncStatus::Success);
        assert_eq!(report.stats.files_processed, 1);
    }

    assert_eq!(harness.sink.cve_enrichment_count(), 1);
    let cve_key = SyncConfiguration::new(
        DataType::CveEnrichment,
        VersionFormat::V2,
        None,
        StorageType::OfflineBundle,
    )
    .checkpoint_key();
    assert!(harness.checkpoints.cursor(&cve_key).is_none());
}

#[tokio::test]
async fn test_every_purl_type_is_synced() {
    let harness = Harness::new();
    let sources = harness
        .sources()
        .with_stream("advisories-v2-npm", vec![StubFile::new(1, 0, vec![advisory("npm-1", "glad")])])
        .with_stream("advisories-v2-pypi", vec![StubFile::new(3, 0, vec![advisory("py-1", "glad")])]);

    let report = harness
        .use_case(sources, settings(&["npm", "pypi"]))
        .execute(DataType::Advisories)
        .await;

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.stats.configurations_processed, 2);
    assert_eq!(harness.sink.advisory_count(), 2);
}

#[tokio::test]
async fn test_legacy_license_stream_merges_versions() {
    let harness = Harness::new();
    let sources = harness.sources().with_stream(
        "licenses-v1-npm",
        vec![StubFile::new(
            1,
            0,
            vec![
                "lodash,4.17.21,MIT".to_string(),
                "lodash,4.17.21,CC0-1.0".to_string(),
                "left-pad,1.3.0,WTFPL".to_string(),
            ],
        )],
    );
    let settings = SyncSettings {
        license_version_format: VersionFormat::V1,
        ..settings(&["npm"])
    };

    let report = harness.use_case(sources, settings).execute(DataType::Licenses).await;

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(harness.sink.package_version_count(), 2);
    let licenses = harness
        .sink
        .package_version_licenses("npm", "lodash", "4.17.21")
        .unwrap();
    assert_eq!(licenses.len(), 2);
}

#[tokio::test]
async fn test_stop_signal_ends_run_after_current_file() {
    let harness = Harness::new();
    let sources = harness.sources().with_stream(
        "advisories-v2-npm",
        vec![
            StubFile::new(1, 0, vec![advisory("a-1", "glad")]).slow(250),
            StubFile::new(2, 0, vec![advisory("a-2", "glad")]),
        ],
    );

    let report = harness.use_case(sources, settings(&["npm"])).execute(DataType::Advisories).await;

    assert_eq!(report.status, SyncStatus::Stopped);
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(harness.checkpoints.cursor(&npm_key()), Some(Cursor::new(1, 0)));
    assert!(harness.sink.advisory("glad", "a-2").is_none());
    assert!(harness.telemetry.saw("stop_observed"));
    assert!(harness
        .leases
        .holder("package_metadata_sync:advisories:0")
        .is_none());
}

#[tokio::test]
async fn test_stopped_run_resumes_where_it_left_off() {
    let harness = Harness::new();
    let files = vec![
        StubFile::new(1, 0, vec![advisory("a-1", "glad")]).slow(250),
        StubFile::new(2, 0, vec![advisory("a-2", "glad")]),
    ];

    let first = harness
        .use_case(harness.sources().with_stream("advisories-v2-npm", files.clone()), settings(&["npm"]))
        .execute(DataType::Advisories)
        .await;
    let second = harness
        .use_case(harness.sources().with_stream("advisories-v2-npm", files), settings(&["npm"]))
        .execute(DataType::Advisories)
        .await;

    assert_eq!(first.status, SyncStatus::Stopped);
    assert_eq!(second.status, SyncStatus::Success);
    assert_eq!(second.stats.files_processed, 1);
    assert_eq!(harness.checkpoints.cursor(&npm_key()), Some(Cursor::new(2, 0)));
}

#[tokio::test]
async fn test_busy_lease_skips_run() {
    let harness = Harness::new();
    harness
        .leases
        .try_acquire("package_metadata_sync:advisories:0", Duration::from_secs(300))
        .await
        .unwrap();
    let sources = harness
        .sources()
        .with_stream("advisories-v2-npm", vec![StubFile::new(1, 0, vec![advisory("a-1", "glad")])]);

    let report = harness.use_case(sources, settings(&["npm"])).execute(DataType::Advisories).await;

    assert_eq!(report.status, SyncStatus::Skipped);
    assert_eq!(harness.sink.advisory_count(), 0);
    assert!(harness.checkpoints.cursor(&npm_key()).is_none());
    assert!(harness.telemetry.saw("lease_busy"));
}

#[tokio::test]
async fn test_other_shard_is_not_blocked() {
    let harness = Harness::new();
    harness
        .leases
        .try_acquire("package_metadata_sync:advisories:1", Duration::from_secs(300))
        .await
        .unwrap();

    let report = harness
        .use_case(harness.sources(), settings(&["npm"]))
        .execute(DataType::Advisories)
        .await;

    assert_eq!(report.status, SyncStatus::Success);
}

#[tokio::test]
async fn test_throttle_sleeps_only_between_batches() {
    let harness = Harness::new();
    let sources = harness.sources().with_stream(
        "advisories-v2-npm",
        vec![StubFile::new(1, 0, vec![advisory("a-1", "glad"), advisory("a-2", "glad")])],
    );
    let settings = SyncSettings {
        batch_size: 1,
        throttle: Duration::from_millis(250),
        ..settings(&["npm"])
    };

    let started = std::time::Instant::now();
    let report = harness.use_case(sources, settings).execute(DataType::Advisories).await;
    let elapsed = started.elapsed();

    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.stats.batches_ingested, 2);
    assert!(elapsed >= Duration::from_millis(250), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_ingestion_failure_keeps_checkpoint() {
    let clock = Arc::new(ManualClock::new());
    let checkpoints = Arc::new(InMemoryCheckpointStore::new());
    let leases = Arc::new(InMemoryLeaseStore::new(clock.clone()));
    let sources = StubSources::new(clock.clone())
        .with_stream("advisories-v2-npm", vec![StubFile::new(1, 0, vec![advisory("a-1", "glad")])]);
    let use_case = SyncPackageMetadataUseCase::new(
        sources,
        checkpoints.clone(),
        leases.clone(),
        UnavailableSink,
        RecordingTelemetry::default(),
        clock,
        settings(&["npm"]),
    );

    let report = use_case.execute(DataType::Advisories).await;

    match &report.status {
        SyncStatus::Failed { kind, message } => {
            assert_eq!(*kind, FailureKind::Ingestion);
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(checkpoints.cursor(&npm_key()).is_none());
    assert!(leases.holder("package_metadata_sync:advisories:0").is_none());
}

#[tokio::test]
async fn test_invalid_settings_fail_before_lease() {
    let harness = Harness::new();
    let settings = SyncSettings {
        storage_type: "ftp".to_string(),
        ..settings(&["npm"])
    };

    let report = harness
        .use_case(harness.sources(), settings)
        .execute(DataType::Advisories)
        .await;

    assert!(matches!(
        report.status,
        SyncStatus::Failed {
            kind: FailureKind::Configuration,
            ..
        }
    ));
    assert!(!harness.telemetry.saw("lease_busy"));
    assert!(harness
        .leases
        .holder("package_metadata_sync:advisories:0")
        .is_none());
}

#[tokio::test]
async fn test_sync_port_delegates_to_execute() {
    let harness = Harness::new();
    let port: Box<dyn SyncPort> = Box::new(harness.use_case(harness.sources(), settings(&["npm"])));

    let report = port.run(DataType::Advisories).await;

    assert_eq!(report.data_type, DataType::Advisories);
    assert_eq!(report.status, SyncStatus::Success);
    assert!(harness.telemetry.saw("sync_finished"));
}

#[test]
fn test_classify_uses_first_typed_error() {
    let source = anyhow::Error::from(SyncError::Source {
        location: "v2/npm/0000000001/000000000.jsonl".to_string(),
        details: "timed out".to_string(),
    })
    .context("while syncing npm");
    assert_eq!(classify(&source), FailureKind::Source);

    let lease = anyhow::Error::from(SyncError::Lease {
        key: "k".to_string(),
        details: "disk full".to_string(),
    });
    assert_eq!(classify(&lease), FailureKind::State);

    assert_eq!(classify(&anyhow::anyhow!("untyped")), FailureKind::Ingestion);
}
