/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (the CLI or a
/// scheduler) use to trigger a sync run.
pub mod sync_port;

pub use sync_port::{FailureKind, SyncPort, SyncReport, SyncStatus};
