use crate::shared::error::RecordError;
use serde_json::Value;
use std::sync::Arc;

/// Telemetry port for reporting from the sync core
///
/// Reporting is fire-and-forget: implementations must not fail back into
/// the caller, so neither method returns a `Result`.
pub trait Telemetry: Send + Sync {
    /// Reports a record that was dropped, together with the raw record
    ///
    /// # Arguments
    /// * `error` - Why the record was rejected
    /// * `raw_record` - The decoded record, or the raw line as a JSON string
    ///   when it could not be decoded at all
    fn record_parse_failure(&self, error: &RecordError, raw_record: &Value);

    /// Reports a structured progress event
    fn record_log(&self, event: &str, fields: &[(&str, String)]);
}

impl<T: Telemetry + ?Sized> Telemetry for Arc<T> {
    fn record_parse_failure(&self, error: &RecordError, raw_record: &Value) {
        (**self).record_parse_failure(error, raw_record)
    }

    fn record_log(&self, event: &str, fields: &[(&str, String)]) {
        (**self).record_log(event, fields)
    }
}
