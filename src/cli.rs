use clap::Parser;
use std::path::PathBuf;

use crate::package_metadata::domain::DataType;

/// Sync advisories, licenses and CVE enrichment from published exports
#[derive(Parser, Debug)]
#[command(name = "advisory-sync")]
#[command(version)]
#[command(
    about = "Sync advisories, licenses and CVE enrichment from published exports",
    long_about = None
)]
pub struct Args {
    /// Data type to sync: advisories, licenses or cve_enrichment
    pub data_type: DataType,

    /// Path to a config file (defaults to ./advisory-sync.config.yml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Storage backend: remote_bucket or offline_bundle
    #[arg(long, value_name = "TYPE")]
    pub storage_type: Option<String>,

    /// Root directory of an offline bundle
    #[arg(long, value_name = "DIR")]
    pub bundle_path: Option<PathBuf>,

    /// Shard index; workers on different shards hold different leases
    #[arg(long)]
    pub shard: Option<u32>,

    /// Disable the pause between ingested batches
    #[arg(long)]
    pub fast: bool,

    /// Directory for checkpoints and leases
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Directory the ingested documents are written to
    #[arg(long, value_name = "DIR")]
    pub sink_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
