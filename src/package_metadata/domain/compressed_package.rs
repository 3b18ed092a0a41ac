use super::sync_configuration::PurlType;
use crate::shared::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A license set that applies to an explicit list of versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherLicense {
    pub licenses: Vec<String>,
    pub versions: Vec<String>,
}

/// License data for every published version of one package.
///
/// Versions between `lowest_version` and `highest_version` use
/// `default_licenses` unless listed in `other_licenses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressedPackage {
    purl_type: PurlType,
    name: String,
    lowest_version: Option<String>,
    highest_version: Option<String>,
    default_licenses: Vec<String>,
    other_licenses: Vec<OtherLicense>,
}

impl CompressedPackage {
    pub fn new(
        purl_type: PurlType,
        name: String,
        lowest_version: Option<String>,
        highest_version: Option<String>,
        default_licenses: Vec<String>,
        other_licenses: Vec<OtherLicense>,
    ) -> Self {
        Self {
            purl_type,
            name,
            lowest_version,
            highest_version,
            default_licenses,
            other_licenses,
        }
    }

    /// Builds a package from one v2 license export record
    pub fn from_record(record: Value, purl_type: &PurlType) -> Result<Self, RecordError> {
        let raw: RawCompressedPackage =
            serde_json::from_value(record).map_err(|e| RecordError::Malformed {
                details: e.to_string(),
            })?;

        let name = raw
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(RecordError::MissingField { field: "name" })?;

        Ok(Self::new(
            purl_type.clone(),
            name,
            raw.lowest_version.filter(|v| !v.is_empty()),
            raw.highest_version.filter(|v| !v.is_empty()),
            raw.default_licenses.unwrap_or_default(),
            raw.other_licenses.unwrap_or_default(),
        ))
    }

    /// Ingestion identity: `(purl_type, name)`
    pub fn identity(&self) -> (&str, &str) {
        (self.purl_type.as_str(), &self.name)
    }

    pub fn purl_type(&self) -> &PurlType {
        &self.purl_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lowest_version(&self) -> Option<&str> {
        self.lowest_version.as_deref()
    }

    pub fn highest_version(&self) -> Option<&str> {
        self.highest_version.as_deref()
    }

    pub fn default_licenses(&self) -> &[String] {
        &self.default_licenses
    }

    pub fn other_licenses(&self) -> &[OtherLicense] {
        &self.other_licenses
    }

    /// Licenses that apply to `version`
    pub fn licenses_for(&self, version: &str) -> &[String] {
        self.other_licenses
            .iter()
            .find(|other| other.versions.iter().any(|v| v == version))
            .map(|other| other.licenses.as_slice())
            .unwrap_or(&self.default_licenses)
    }
}

#[derive(Debug, Deserialize)]
struct RawCompressedPackage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    lowest_version: Option<String>,
    #[serde(default)]
    highest_version: Option<String>,
    #[serde(default)]
    default_licenses: Option<Vec<String>>,
    #[serde(default)]
    other_licenses: Option<Vec<OtherLicense>>,
}
