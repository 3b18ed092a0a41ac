use crate::ports::outbound::Telemetry;
use crate::shared::error::RecordError;
use serde_json::Value;

/// Longest raw record echoed into a log line
const MAX_RAW_RECORD_CHARS: usize = 2048;

/// TracingTelemetry adapter forwarding telemetry to `tracing`
///
/// Rejected records become `warn` events, progress events `info` events.
/// Where they end up (stderr text, JSON lines) is up to the subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl Telemetry for TracingTelemetry {
    fn record_parse_failure(&self, error: &RecordError, raw_record: &Value) {
        tracing::warn!(
            error = %error,
            raw_record = %truncate(&raw_record.to_string()),
            "dropped invalid record"
        );
    }

    fn record_log(&self, event: &str, fields: &[(&str, String)]) {
        tracing::info!(fields = %format_fields(fields), "{event}");
    }
}

fn format_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(raw: &str) -> &str {
    match raw.char_indices().nth(MAX_RAW_RECORD_CHARS) {
        Some((index, _)) => &raw[..index],
        None => raw,
    }
}
