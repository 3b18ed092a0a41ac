/// Mock implementations for testing
mod failing_sink;
mod manual_clock;
mod mock_file_source;
mod recording_telemetry;

#[allow(unused_imports)]
pub use failing_sink::FailingSink;
#[allow(unused_imports)]
pub use manual_clock::ManualClock;
#[allow(unused_imports)]
pub use mock_file_source::MockFileSourceProvider;
#[allow(unused_imports)]
pub use recording_telemetry::RecordingTelemetry;
