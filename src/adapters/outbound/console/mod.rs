/// Console adapters: telemetry written through the `tracing` subscriber
mod tracing_telemetry;

pub use tracing_telemetry::TracingTelemetry;
