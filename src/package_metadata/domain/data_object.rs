use super::advisory::Advisory;
use super::compressed_package::CompressedPackage;
use super::cve_enrichment::CveEnrichment;
use super::license_record::LicenseRecord;
use super::sync_configuration::{DataType, SyncConfiguration, VersionFormat};
use std::fmt;

/// Which domain object a stream's records become
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataObjectKind {
    Advisory,
    CompressedPackage,
    LicenseRecord,
    CveEnrichment,
}

impl DataObjectKind {
    /// Selects the kind for a stream: CVE enrichment first, then advisories,
    /// then licenses by version format.
    pub fn for_config(config: &SyncConfiguration) -> Self {
        match (config.data_type(), config.version_format()) {
            (DataType::CveEnrichment, _) => DataObjectKind::CveEnrichment,
            (DataType::Advisories, _) => DataObjectKind::Advisory,
            (DataType::Licenses, VersionFormat::V1) => DataObjectKind::LicenseRecord,
            (DataType::Licenses, VersionFormat::V2) => DataObjectKind::CompressedPackage,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataObjectKind::Advisory => "advisory",
            DataObjectKind::CompressedPackage => "compressed_package",
            DataObjectKind::LicenseRecord => "license_record",
            DataObjectKind::CveEnrichment => "cve_enrichment",
        }
    }
}

impl fmt::Display for DataObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, typed record ready for ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum DataObject {
    Advisory(Advisory),
    CompressedPackage(CompressedPackage),
    LicenseRecord(LicenseRecord),
    CveEnrichment(CveEnrichment),
}

impl DataObject {
    pub fn kind(&self) -> DataObjectKind {
        match self {
            DataObject::Advisory(_) => DataObjectKind::Advisory,
            DataObject::CompressedPackage(_) => DataObjectKind::CompressedPackage,
            DataObject::LicenseRecord(_) => DataObjectKind::LicenseRecord,
            DataObject::CveEnrichment(_) => DataObjectKind::CveEnrichment,
        }
    }

    pub fn into_advisory(self) -> Option<Advisory> {
        match self {
            DataObject::Advisory(advisory) => Some(advisory),
            _ => None,
        }
    }

    pub fn into_compressed_package(self) -> Option<CompressedPackage> {
        match self {
            DataObject::CompressedPackage(package) => Some(package),
            _ => None,
        }
    }

    pub fn into_license_record(self) -> Option<LicenseRecord> {
        match self {
            DataObject::LicenseRecord(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_cve_enrichment(self) -> Option<CveEnrichment> {
        match self {
            DataObject::CveEnrichment(enrichment) => Some(enrichment),
            _ => None,
        }
    }
}
