//! Error types for lesson decoding and calendar export.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that abort an export as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Unsupported time zone '{0}': no transition rule available")]
    UnsupportedZone(String),
}

/// Errors that make a whole Schedule Provider payload unreadable.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed schedule payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected schedule payload: expected an object or an array, got {0}")]
    Shape(&'static str),
}

/// A single lesson that was left out of an export.
///
/// `index` is the lesson's position in the collection it came from, so the
/// caller can point the user at the offending entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("lesson {index} ({}): {reason}", .title.as_deref().unwrap_or("untitled"))]
pub struct InvalidRecord {
    pub index: usize,
    pub title: Option<String>,
    pub reason: InvalidReason,
}

impl InvalidRecord {
    pub fn new(index: usize, title: Option<&str>, reason: InvalidReason) -> Self {
        InvalidRecord {
            index,
            title: title.map(str::to_string),
            reason,
        }
    }
}

/// Why a lesson could not be exported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unreadable {field} timestamp '{value}'")]
    BadTimestamp { field: &'static str, value: String },

    #[error("end {end} is not after start {start}")]
    EndNotAfterStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("local time {0} does not exist in the export time zone")]
    NonexistentLocalTime(NaiveDateTime),

    #[error("entry is not a lesson object")]
    NotAnObject,

    #[error("malformed lesson: {0}")]
    Malformed(String),
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
