use crate::shared::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length for CVE identifiers
const MAX_CVE_ID_LENGTH: usize = 32;

/// Exploit-prediction data for one CVE
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CveEnrichment {
    cve_id: String,
    epss_score: f64,
    is_known_exploit: bool,
}

impl CveEnrichment {
    pub fn from_record(record: Value) -> Result<Self, RecordError> {
        let raw: RawCveEnrichment =
            serde_json::from_value(record).map_err(|e| RecordError::Malformed {
                details: e.to_string(),
            })?;

        let cve_id = raw
            .cve_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(RecordError::MissingField { field: "cve_id" })?;
        let cve_id = normalize_cve_id(&cve_id)?;

        let epss_score = raw.epss_score.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&epss_score) {
            return Err(RecordError::InvalidField {
                field: "epss_score",
                reason: format!("{} is outside [0, 1]", epss_score),
            });
        }

        Ok(Self {
            cve_id,
            epss_score,
            is_known_exploit: raw.is_known_exploit.unwrap_or(false),
        })
    }

    /// Ingestion identity
    pub fn cve_id(&self) -> &str {
        &self.cve_id
    }

    pub fn epss_score(&self) -> f64 {
        self.epss_score
    }

    pub fn is_known_exploit(&self) -> bool {
        self.is_known_exploit
    }
}

/// Validates `CVE-YYYY-NNNN+` and upper-cases it
fn normalize_cve_id(value: &str) -> Result<String, RecordError> {
    let invalid = |reason: &str| RecordError::InvalidField {
        field: "cve_id",
        reason: format!("'{}' {}", value, reason),
    };

    if value.len() > MAX_CVE_ID_LENGTH {
        return Err(invalid("is too long"));
    }

    let upper = value.trim().to_ascii_uppercase();
    let mut parts = upper.splitn(3, '-');
    let (prefix, year, number) = match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(year), Some(number)) => (prefix, year, number),
        _ => return Err(invalid("is not of the form CVE-YYYY-NNNN")),
    };

    if prefix != "CVE"
        || year.len() != 4
        || !year.bytes().all(|b| b.is_ascii_digit())
        || number.len() < 4
        || !number.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid("is not of the form CVE-YYYY-NNNN"));
    }

    Ok(upper)
}

#[derive(Debug, Deserialize)]
struct RawCveEnrichment {
    #[serde(default)]
    cve_id: Option<String>,
    #[serde(default)]
    epss_score: Option<f64>,
    #[serde(default)]
    is_known_exploit: Option<bool>,
}
