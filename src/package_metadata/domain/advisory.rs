use super::sync_configuration::PurlType;
use crate::package_metadata::policies::KnownSources;
use crate::shared::error::RecordError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier attached to an advisory (CVE, GHSA, vendor id, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub name: String,
    pub value: String,
    pub url: Option<String>,
}

/// A package affected by an advisory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedPackage {
    purl_type: PurlType,
    package_name: String,
    affected_range: String,
    solution: String,
    fixed_versions: Vec<String>,
    distro_version: String,
    versions: Vec<Value>,
    overridden_advisory_fields: Map<String, Value>,
}

impl AffectedPackage {
    fn from_raw(raw: RawAffectedPackage, purl_type: &PurlType) -> Result<Self, RecordError> {
        let package_name = non_empty(raw.name).ok_or(RecordError::MissingField {
            field: "packages[].name",
        })?;

        // "debian" + "12" -> "debian 12"; either half may be absent
        let distro_version = raw
            .distro
            .map(|distro| {
                [distro.name, distro.version]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        Ok(Self {
            purl_type: purl_type.clone(),
            package_name,
            affected_range: raw.affected_range.unwrap_or_default(),
            solution: raw.solution.unwrap_or_default(),
            fixed_versions: raw.fixed_versions.unwrap_or_default(),
            distro_version,
            versions: raw.versions.unwrap_or_default(),
            overridden_advisory_fields: raw.overridden_advisory_fields.unwrap_or_default(),
        })
    }

    pub fn purl_type(&self) -> &PurlType {
        &self.purl_type
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn affected_range(&self) -> &str {
        &self.affected_range
    }

    pub fn solution(&self) -> &str {
        &self.solution
    }

    pub fn fixed_versions(&self) -> &[String] {
        &self.fixed_versions
    }

    pub fn distro_version(&self) -> &str {
        &self.distro_version
    }

    pub fn versions(&self) -> &[Value] {
        &self.versions
    }

    pub fn overridden_advisory_fields(&self) -> &Map<String, Value> {
        &self.overridden_advisory_fields
    }
}

/// Advisory value object with its affected packages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    advisory_xid: String,
    source_xid: String,
    published_date: Option<NaiveDate>,
    title: String,
    description: String,
    cvss_v2: Option<String>,
    cvss_v3: Option<String>,
    urls: Vec<String>,
    identifiers: Vec<Identifier>,
    cve: Option<String>,
    affected_packages: Vec<AffectedPackage>,
}

impl Advisory {
    /// Builds an advisory from one exported record.
    ///
    /// Rejects records without an advisory id, with a source outside the
    /// allow-list, or without a `packages` list.
    pub fn from_record(record: Value, purl_type: &PurlType) -> Result<Self, RecordError> {
        let raw: RawAdvisoryRecord =
            serde_json::from_value(record).map_err(|e| RecordError::Malformed {
                details: e.to_string(),
            })?;

        let advisory = raw
            .advisory
            .ok_or(RecordError::MissingField { field: "advisory" })?;
        let packages = raw
            .packages
            .ok_or(RecordError::MissingField { field: "packages" })?;

        let source_xid = non_empty(advisory.source).ok_or(RecordError::MissingField {
            field: "advisory.source",
        })?;
        if !KnownSources::is_supported(&source_xid) {
            return Err(RecordError::UnsupportedSource { source_xid });
        }

        let advisory_xid = non_empty(advisory.id).ok_or(RecordError::MissingField {
            field: "advisory.id",
        })?;

        let published_date = match non_empty(advisory.published_date) {
            Some(date) => Some(NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                RecordError::InvalidField {
                    field: "advisory.published_date",
                    reason: format!("'{}': {}", date, e),
                }
            })?),
            None => None,
        };

        let identifiers: Vec<Identifier> = advisory
            .identifiers
            .unwrap_or_default()
            .into_iter()
            .map(RawIdentifier::into_identifier)
            .collect();
        let cve = identifiers
            .iter()
            .find(|identifier| identifier.identifier_type.eq_ignore_ascii_case("cve"))
            .map(|identifier| identifier.name.clone());

        let affected_packages = packages
            .into_iter()
            .map(|package| AffectedPackage::from_raw(package, purl_type))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            advisory_xid,
            source_xid,
            published_date,
            title: advisory.title.unwrap_or_default(),
            description: advisory.description.unwrap_or_default(),
            cvss_v2: non_empty(advisory.cvss_v2),
            cvss_v3: non_empty(advisory.cvss_v3),
            urls: advisory.urls.unwrap_or_default(),
            identifiers,
            cve,
            affected_packages,
        })
    }

    /// Ingestion identity: `(source_xid, advisory_xid)`
    pub fn identity(&self) -> (&str, &str) {
        (&self.source_xid, &self.advisory_xid)
    }

    pub fn advisory_xid(&self) -> &str {
        &self.advisory_xid
    }

    pub fn source_xid(&self) -> &str {
        &self.source_xid
    }

    pub fn published_date(&self) -> Option<NaiveDate> {
        self.published_date
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cvss_v2(&self) -> Option<&str> {
        self.cvss_v2.as_deref()
    }

    pub fn cvss_v3(&self) -> Option<&str> {
        self.cvss_v3.as_deref()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn cve(&self) -> Option<&str> {
        self.cve.as_deref()
    }

    pub fn affected_packages(&self) -> &[AffectedPackage] {
        &self.affected_packages
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Export record structures

#[derive(Debug, Deserialize)]
struct RawAdvisoryRecord {
    #[serde(default)]
    advisory: Option<RawAdvisory>,
    #[serde(default)]
    packages: Option<Vec<RawAffectedPackage>>,
}

#[derive(Debug, Deserialize)]
struct RawAdvisory {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    cvss_v2: Option<String>,
    #[serde(default)]
    cvss_v3: Option<String>,
    #[serde(default)]
    urls: Option<Vec<String>>,
    #[serde(default)]
    identifiers: Option<Vec<RawIdentifier>>,
}

#[derive(Debug, Deserialize)]
struct RawIdentifier {
    #[serde(rename = "type", default)]
    identifier_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl RawIdentifier {
    fn into_identifier(self) -> Identifier {
        Identifier {
            identifier_type: self.identifier_type.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            value: self.value.unwrap_or_default(),
            url: non_empty(self.url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAffectedPackage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    affected_range: Option<String>,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default)]
    fixed_versions: Option<Vec<String>>,
    #[serde(default)]
    versions: Option<Vec<Value>>,
    #[serde(default)]
    distro: Option<RawDistro>,
    #[serde(default)]
    overridden_advisory_fields: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawDistro {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}
