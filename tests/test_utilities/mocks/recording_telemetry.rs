use advisory_sync::prelude::*;
use advisory_sync::shared::error::RecordError;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Mock Telemetry that captures parse failures and log events
#[derive(Default, Clone)]
pub struct RecordingTelemetry {
    pub failures: Arc<Mutex<Vec<(RecordError, Value)>>>,
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }

    pub fn get_failures(&self) -> Vec<(RecordError, Value)> {
        self.failures.lock().unwrap().clone()
    }

    pub fn saw(&self, event: &str) -> bool {
        self.events.lock().unwrap().iter().any(|e| e == event)
    }
}

impl Telemetry for RecordingTelemetry {
    fn record_parse_failure(&self, error: &RecordError, raw_record: &Value) {
        self.failures
            .lock()
            .unwrap()
            .push((error.clone(), raw_record.clone()));
    }

    fn record_log(&self, event: &str, _fields: &[(&str, String)]) {
        self.events.lock().unwrap().push(event.to_string());
    }
}
