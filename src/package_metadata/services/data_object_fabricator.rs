use crate::package_metadata::domain::{
    Advisory, CompressedPackage, CveEnrichment, DataObject, DataObjectKind, LicenseRecord,
    PurlType, SyncConfiguration,
};
use crate::ports::outbound::{RawRecords, Telemetry};
use crate::shared::error::{RecordError, SyncError};
use crate::shared::Result;
use serde_json::Value;

/// How one line of a stream becomes a domain object
#[derive(Debug, Clone)]
enum RecordDecoder {
    Advisory(PurlType),
    CompressedPackage(PurlType),
    LicenseRecord(PurlType),
    CveEnrichment,
}

impl RecordDecoder {
    fn for_config(config: &SyncConfiguration) -> Result<Self> {
        let kind = DataObjectKind::for_config(config);
        let decoder = match kind {
            DataObjectKind::CveEnrichment => RecordDecoder::CveEnrichment,
            DataObjectKind::Advisory => RecordDecoder::Advisory(required_purl_type(config, kind)?),
            DataObjectKind::CompressedPackage => {
                RecordDecoder::CompressedPackage(required_purl_type(config, kind)?)
            }
            DataObjectKind::LicenseRecord => {
                RecordDecoder::LicenseRecord(required_purl_type(config, kind)?)
            }
        };
        Ok(decoder)
    }

    /// Decodes a non-blank line.
    ///
    /// On failure the returned value is what telemetry receives as the raw
    /// record: the parsed JSON when the line decoded, the line itself otherwise.
    fn decode(&self, line: &str) -> std::result::Result<DataObject, (RecordError, Value)> {
        match self {
            RecordDecoder::LicenseRecord(purl_type) => LicenseRecord::from_csv_line(line, purl_type)
                .map(DataObject::LicenseRecord)
                .map_err(|e| (e, Value::String(line.to_string()))),
            RecordDecoder::Advisory(purl_type) => decode_json(line, |record| {
                Advisory::from_record(record, purl_type).map(DataObject::Advisory)
            }),
            RecordDecoder::CompressedPackage(purl_type) => decode_json(line, |record| {
                CompressedPackage::from_record(record, purl_type).map(DataObject::CompressedPackage)
            }),
            RecordDecoder::CveEnrichment => decode_json(line, |record| {
                CveEnrichment::from_record(record).map(DataObject::CveEnrichment)
            }),
        }
    }
}

fn required_purl_type(config: &SyncConfiguration, kind: DataObjectKind) -> Result<PurlType> {
    config.purl_type().cloned().ok_or_else(|| {
        SyncError::configuration(
            format!("{} streams are scoped to a purl type, but {} has none", kind, config),
            "Configure at least one entry in purl_types",
        )
        .into()
    })
}

fn decode_json<F>(line: &str, build: F) -> std::result::Result<DataObject, (RecordError, Value)>
where
    F: FnOnce(Value) -> std::result::Result<DataObject, RecordError>,
{
    let record: Value = serde_json::from_str(line).map_err(|e| {
        (
            RecordError::Malformed {
                details: e.to_string(),
            },
            Value::String(line.to_string()),
        )
    })?;
    build(record.clone()).map_err(|e| (e, record))
}

/// DataObjectFabricator - turns the lines of one file into domain objects
///
/// A lazy, single-pass iterator. Records that fail validation are reported
/// to telemetry and skipped; they never end the sequence. An `Err` item
/// means the file itself could not be read, and ends the sequence.
pub struct DataObjectFabricator<'a> {
    lines: RawRecords,
    decoder: RecordDecoder,
    telemetry: &'a dyn Telemetry,
    produced: usize,
    rejected: usize,
    failed: bool,
}

impl<'a> DataObjectFabricator<'a> {
    /// Creates a fabricator for the records of a file in `config`'s stream
    ///
    /// # Errors
    /// Returns a configuration error when a purl-scoped stream has no purl type.
    pub fn new(
        lines: RawRecords,
        config: &SyncConfiguration,
        telemetry: &'a dyn Telemetry,
    ) -> Result<Self> {
        Ok(Self {
            lines,
            decoder: RecordDecoder::for_config(config)?,
            telemetry,
            produced: 0,
            rejected: 0,
            failed: false,
        })
    }

    /// Number of objects yielded so far
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Number of records dropped so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl Iterator for DataObjectFabricator<'_> {
    type Item = Result<DataObject>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(anyhow::Error::new(e).context("Failed to read record line")));
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.decoder.decode(line) {
                Ok(object) => {
                    self.produced += 1;
                    return Some(Ok(object));
                }
                Err((error, raw_record)) => {
                    self.rejected += 1;
                    self.telemetry.record_parse_failure(&error, &raw_record);
                }
            }
        }
    }
}
