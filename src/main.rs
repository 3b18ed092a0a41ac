use advisory_sync::adapters::outbound::console::TracingTelemetry;
use advisory_sync::adapters::outbound::filesystem::{
    FileCheckpointStore, FileIngestionSink, FileLeaseStore,
};
use advisory_sync::adapters::outbound::SystemClock;
use advisory_sync::application::dto::{BucketSettings, StorageSettings, SyncSettings};
use advisory_sync::application::factories::ConnectorFactory;
use advisory_sync::application::use_cases::SyncPackageMetadataUseCase;
use advisory_sync::cli::Args;
use advisory_sync::config::{self, ConfigFile};
use advisory_sync::ports::inbound::{FailureKind, SyncReport, SyncStatus};
use advisory_sync::ports::outbound::Clock;
use advisory_sync::shared::error::ExitCode;
use advisory_sync::shared::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_STATE_DIR: &str = ".advisory-sync";

#[tokio::main]
async fn main() {
    // clap exits with code 2 on invalid arguments
    let args = Args::parse_args();
    init_tracing(args.log_json);

    match run(args).await {
        Ok(report) => process::exit(exit_code_for(&report).as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ConfigurationError.as_i32());
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Everything a run needs, after the config file and the flags are merged
#[derive(Debug)]
struct RunSettings {
    sync: SyncSettings,
    storage: StorageSettings,
    state_dir: PathBuf,
    sink_dir: PathBuf,
}

async fn run(args: Args) -> Result<SyncReport> {
    let config = match &args.config {
        Some(path) => config::load_config_from_path(path)?,
        None => {
            let dir = std::env::current_dir()?;
            let discovered = config::discover_config(&dir)?;
            if discovered.is_some() {
                tracing::info!(
                    path = %dir.join(config::CONFIG_FILENAME).display(),
                    "auto-discovered config file"
                );
            }
            discovered.unwrap_or_default()
        }
    };
    let settings = merge_settings(&args, config);
    tracing::debug!(?settings, "resolved settings");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let use_case = SyncPackageMetadataUseCase::new(
        ConnectorFactory::new(settings.storage),
        FileCheckpointStore::new(&settings.state_dir),
        FileLeaseStore::new(&settings.state_dir, clock.clone()),
        FileIngestionSink::new(&settings.sink_dir),
        TracingTelemetry::new(),
        clock,
        settings.sync,
    );

    let report = use_case.execute(args.data_type).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report)
}

/// Flags override the config file, which overrides the defaults
fn merge_settings(args: &Args, config: ConfigFile) -> RunSettings {
    let defaults = SyncSettings::default();
    let throttle = if args.fast {
        Duration::ZERO
    } else {
        config
            .throttle_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.throttle)
    };

    let sync = SyncSettings {
        storage_type: args
            .storage_type
            .clone()
            .or(config.storage_type)
            .unwrap_or(defaults.storage_type),
        purl_types: config.purl_types.unwrap_or(defaults.purl_types),
        license_version_format: config
            .license_version_format
            .unwrap_or(defaults.license_version_format),
        batch_size: config.batch_size.unwrap_or(defaults.batch_size),
        throttle,
        lease_ttl: config
            .lease_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.lease_ttl),
        max_run_duration: config
            .max_run_duration_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_run_duration),
        shard: args.shard.or(config.shard).unwrap_or(defaults.shard),
    };

    let bucket = config.bucket.unwrap_or_default();
    let storage = StorageSettings {
        bucket: BucketSettings {
            base_url: bucket
                .base_url
                .unwrap_or_else(|| BucketSettings::default().base_url),
            advisories: bucket.advisories,
            licenses: bucket.licenses,
            cve_enrichment: bucket.cve_enrichment,
        },
        bundle_path: args.bundle_path.clone().or(config.bundle_path),
    };

    let state_dir = args
        .state_dir
        .clone()
        .or(config.state_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
    let sink_dir = args
        .sink_dir
        .clone()
        .or(config.sink_dir)
        .unwrap_or_else(|| state_dir.join("sink"));

    RunSettings {
        sync,
        storage,
        state_dir,
        sink_dir,
    }
}

fn exit_code_for(report: &SyncReport) -> ExitCode {
    match &report.status {
        SyncStatus::Success | SyncStatus::Stopped | SyncStatus::Skipped => ExitCode::Success,
        SyncStatus::Failed {
            kind: FailureKind::Configuration,
            ..
        } => ExitCode::ConfigurationError,
        SyncStatus::Failed { .. } => ExitCode::SyncFailed,
    }
}
