use super::sync_configuration::PurlType;
use crate::shared::error::RecordError;
use serde::Serialize;

/// One line of the legacy (v1) license export: `name,version,license`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseRecord {
    purl_type: PurlType,
    name: String,
    version: String,
    license: String,
}

impl LicenseRecord {
    /// Parses a single CSV line of the legacy export
    pub fn from_csv_line(line: &str, purl_type: &PurlType) -> Result<Self, RecordError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let row = reader
            .records()
            .next()
            .ok_or_else(|| RecordError::Malformed {
                details: "empty line".to_string(),
            })?
            .map_err(|e| RecordError::Malformed {
                details: e.to_string(),
            })?;

        if row.len() != 3 {
            return Err(RecordError::Malformed {
                details: format!("expected 3 fields, found {}", row.len()),
            });
        }

        let field = |index: usize, name: &'static str| -> Result<String, RecordError> {
            let value = row.get(index).unwrap_or_default().trim();
            if value.is_empty() {
                return Err(RecordError::MissingField { field: name });
            }
            Ok(value.to_string())
        };

        Ok(Self {
            purl_type: purl_type.clone(),
            name: field(0, "name")?,
            version: field(1, "version")?,
            license: field(2, "license")?,
        })
    }

    /// Ingestion identity: `(purl_type, name, version)`
    pub fn identity(&self) -> (&str, &str, &str) {
        (self.purl_type.as_str(), &self.name, &self.version)
    }

    pub fn purl_type(&self) -> &PurlType {
        &self.purl_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn license(&self) -> &str {
        &self.license
    }
}
