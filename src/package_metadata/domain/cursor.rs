use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of one published file within a stream.
///
/// Ordering is by `sequence`, then `chunk`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Cursor {
    sequence: u64,
    chunk: u64,
}

impl Cursor {
    pub fn new(sequence: u64, chunk: u64) -> Self {
        Self { sequence, chunk }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn chunk(&self) -> u64 {
        self.chunk
    }

    /// Parses a stream-relative file name of the form `<sequence>/<chunk>.<ext>`.
    ///
    /// Returns `None` for names that do not follow the layout.
    pub fn from_file_name(relative_name: &str, extension: &str) -> Option<Self> {
        let (sequence, file_name) = relative_name.split_once('/')?;
        let chunk = file_name.strip_suffix(extension)?.strip_suffix('.')?;

        if sequence.is_empty() || chunk.is_empty() {
            return None;
        }
        if !sequence.bytes().all(|b| b.is_ascii_digit())
            || !chunk.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        Some(Self::new(sequence.parse().ok()?, chunk.parse().ok()?))
    }

    /// Stream-relative name with the zero padding used by publishers
    pub fn file_name(&self, extension: &str) -> String {
        format!("{:010}/{:09}.{}", self.sequence, self.chunk, extension)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.sequence, self.chunk)
    }
}

/// Where to resume a stream from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPosition {
    /// Nothing has been ingested yet; every file is admitted
    Start,
    /// Files up to and including this cursor are already ingested
    After(Cursor),
}

impl StreamPosition {
    /// Whether a file at `cursor` still needs to be ingested
    pub fn admits(&self, cursor: Cursor) -> bool {
        match self {
            StreamPosition::Start => true,
            StreamPosition::After(checkpoint) => cursor > *checkpoint,
        }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        match self {
            StreamPosition::Start => None,
            StreamPosition::After(cursor) => Some(*cursor),
        }
    }
}

impl From<Option<Cursor>> for StreamPosition {
    fn from(cursor: Option<Cursor>) -> Self {
        cursor.map_or(StreamPosition::Start, StreamPosition::After)
    }
}

impl fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamPosition::Start => f.write_str("start of stream"),
            StreamPosition::After(cursor) => write!(f, "after {}", cursor),
        }
    }
}
