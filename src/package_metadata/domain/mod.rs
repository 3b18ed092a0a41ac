pub mod advisory;
pub mod compressed_package;
pub mod cursor;
pub mod cve_enrichment;
pub mod data_object;
pub mod license_record;
pub mod run_state;
pub mod sync_configuration;

pub use advisory::{AffectedPackage, Advisory, Identifier};
pub use compressed_package::{CompressedPackage, OtherLicense};
pub use cursor::{Cursor, StreamPosition};
pub use cve_enrichment::CveEnrichment;
pub use data_object::{DataObject, DataObjectKind};
pub use license_record::LicenseRecord;
pub use run_state::{FileSummary, RunState, SyncStats};
pub use sync_configuration::{
    CheckpointKey, DataType, PurlType, StorageType, SyncConfiguration, VersionFormat,
};
