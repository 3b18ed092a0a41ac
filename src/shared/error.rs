use std::fmt;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// Schedulers use these to decide whether to page, retry, or wait for the
/// next run. Skipped and stopped runs are normal operation and exit with 0;
/// the JSON report on stdout tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed, stopped early, or skipped because another worker holds the lease
    Success = 0,
    /// A stream failed while syncing (ingestion, source, or state store error)
    SyncFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Deployment/configuration error
    ConfigurationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::SyncFailed => write!(f, "Sync Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ConfigurationError => write!(f, "Configuration Error (3)"),
        }
    }
}

/// Errors that abort a sync run.
///
/// Per-record problems are not represented here; see [`RecordError`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync configuration: {message}\n\n💡 Hint: {hint}")]
    Configuration { message: String, hint: String },

    #[error("Unsupported storage type: '{value}'\n\n💡 Hint: Use 'remote_bucket' or 'offline_bundle'")]
    UnsupportedStorageType { value: String },

    #[error("Failed to read {location} from the file source\nDetails: {details}")]
    Source { location: String, details: String },

    #[error("Checkpoint store failure for {key}\nDetails: {details}")]
    Checkpoint { key: String, details: String },

    #[error("Lease store failure for {key}\nDetails: {details}")]
    Lease { key: String, details: String },

    #[error("Failed to ingest {kind} batch\nDetails: {details}")]
    Ingestion { kind: String, details: String },

    #[error("Ingestion service for {expected} received a {found} object")]
    UnexpectedDataObject { expected: String, found: String },
}

impl SyncError {
    /// Shorthand for a configuration error with a hint line
    pub fn configuration(message: impl Into<String>, hint: impl Into<String>) -> Self {
        SyncError::Configuration {
            message: message.into(),
            hint: hint.into(),
        }
    }
}

/// A raw record that could not be turned into a domain object.
///
/// These are recovered by the fabricator and reported to telemetry;
/// they never abort a run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordError {
    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },

    #[error("advisory source '{source_xid}' is not supported")]
    UnsupportedSource { source_xid: String },

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed record: {details}")]
    Malformed { details: String },
}
