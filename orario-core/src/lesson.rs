//! Lesson records and decoding of Schedule Provider payloads.
//!
//! The provider answers with one JSON object per lesson, using upper-case
//! keys and the literal string `"null"` for missing values. Records are
//! validated here, at the input boundary, so the exporter only ever sees
//! well-typed lessons.

use std::fmt;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::error::{DecodeError, InvalidReason, InvalidRecord};

/// Naive timestamp layouts accepted from the provider, most specific first.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Start or end of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonTime {
    /// Civil time in the export zone, e.g. `2024-01-15T09:00:00`
    Local(NaiveDateTime),
    /// An instant with an explicit UTC offset
    Absolute(DateTime<FixedOffset>),
}

impl LessonTime {
    /// Parse an ISO 8601 timestamp, with or without an offset.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(LessonTime::Absolute(dt));
        }

        LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(LessonTime::Local)
    }

    /// Pin this time to an instant in `tz`.
    ///
    /// Local times falling in a DST gap do not exist and come back as `Err`.
    /// Local times repeated by a DST overlap resolve to the earlier instant.
    pub fn resolve(&self, tz: &Tz) -> Result<DateTime<Tz>, NaiveDateTime> {
        match self {
            LessonTime::Local(naive) => match tz.from_local_datetime(naive) {
                LocalResult::Single(dt) => Ok(dt),
                LocalResult::Ambiguous(earliest, _) => Ok(earliest),
                LocalResult::None => Err(*naive),
            },
            LessonTime::Absolute(dt) => Ok(dt.with_timezone(tz)),
        }
    }

    /// Best-effort wall-clock reading, used for ordering and display.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            LessonTime::Local(naive) => *naive,
            LessonTime::Absolute(dt) => dt.naive_local(),
        }
    }
}

impl fmt::Display for LessonTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonTime::Local(naive) => write!(f, "{}", naive.format("%Y-%m-%d %H:%M")),
            LessonTime::Absolute(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M %:z")),
        }
    }
}

/// A validated lesson, ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub title: String,
    pub start: LessonTime,
    pub end: LessonTime,
    pub lecturer_name: Option<String>,
    /// Secondary link to the lecturer's page
    pub lecturer_url: Option<String>,
    pub classroom_name: Option<String>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    /// Link to the teaching's description page
    pub detail_url: Option<String>,
    pub credits: Option<String>,
}

impl LessonRecord {
    /// A lesson with only the required fields set.
    pub fn new(title: impl Into<String>, start: LessonTime, end: LessonTime) -> Self {
        LessonRecord {
            title: title.into(),
            start,
            end,
            lecturer_name: None,
            lecturer_url: None,
            classroom_name: None,
            location_name: None,
            address: None,
            detail_url: None,
            credits: None,
        }
    }
}

/// A lesson exactly as the Schedule Provider sends it.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawLesson {
    #[serde(rename = "TEACHING", default, deserialize_with = "nullable")]
    pub teaching: Option<String>,
    #[serde(rename = "START_ISO8601", default, deserialize_with = "nullable")]
    pub start: Option<String>,
    #[serde(rename = "END_ISO8601", default, deserialize_with = "nullable")]
    pub end: Option<String>,
    #[serde(rename = "LECTURER_NAME", default, deserialize_with = "nullable")]
    pub lecturer_name: Option<String>,
    #[serde(rename = "URL_DOCENTE", default, deserialize_with = "nullable")]
    pub lecturer_url: Option<String>,
    #[serde(rename = "CLASSROOM_NAME", default, deserialize_with = "nullable")]
    pub classroom_name: Option<String>,
    #[serde(rename = "LOCATION_NAME", default, deserialize_with = "nullable")]
    pub location_name: Option<String>,
    #[serde(rename = "ADDRESS", default, deserialize_with = "nullable")]
    pub address: Option<String>,
    #[serde(rename = "URLS_INSEGNAMENTO", default, deserialize_with = "nullable")]
    pub detail_url: Option<String>,
    #[serde(rename = "CREDITS", default, deserialize_with = "nullable")]
    pub credits: Option<String>,
}

impl TryFrom<RawLesson> for LessonRecord {
    type Error = InvalidReason;

    fn try_from(raw: RawLesson) -> Result<Self, Self::Error> {
        let title = raw.teaching.ok_or(InvalidReason::MissingField("title"))?;
        let start = parse_field("start", raw.start)?;
        let end = parse_field("end", raw.end)?;

        Ok(LessonRecord {
            title,
            start,
            end,
            lecturer_name: raw.lecturer_name,
            lecturer_url: raw.lecturer_url,
            classroom_name: raw.classroom_name,
            location_name: raw.location_name,
            address: raw.address,
            detail_url: raw.detail_url,
            credits: raw.credits,
        })
    }
}

fn parse_field(field: &'static str, value: Option<String>) -> Result<LessonTime, InvalidReason> {
    let value = value.ok_or(InvalidReason::MissingField(field))?;
    LessonTime::parse(&value).ok_or(InvalidReason::BadTimestamp { field, value })
}

/// Accept strings, numbers and booleans; map null-like values to `None`.
/// Nested lists and objects are an error.
fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(clean(&s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Array(_)) => Err(de::Error::custom("expected a scalar field, found a list")),
        Some(Value::Object(_)) => Err(de::Error::custom("expected a scalar field, found an object")),
    }
}

fn clean(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("nan")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Outcome of decoding a provider payload.
///
/// Lessons keep their position in the payload so that rejected and accepted
/// entries can be reported against the same numbering.
#[derive(Debug, Default, Clone)]
pub struct Decoded {
    pub lessons: Vec<(usize, LessonRecord)>,
    pub rejected: Vec<InvalidRecord>,
}

/// Decode the body of the provider's lesson query.
///
/// Accepts an object keyed by row index (the provider's native shape), a
/// plain array, or either of those wrapped once in a JSON string.
pub fn decode_lessons(json: &str) -> Result<Decoded, DecodeError> {
    let value = match serde_json::from_str::<Value>(json)? {
        Value::String(inner) => serde_json::from_str::<Value>(&inner)?,
        other => other,
    };

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut rows: Vec<(String, Value)> = map.into_iter().collect();
            rows.sort_by(|(a, _), (b, _)| row_order(a, b));
            rows.into_iter().map(|(_, v)| v).collect()
        }
        Value::Null => return Err(DecodeError::Shape("null")),
        Value::Bool(_) => return Err(DecodeError::Shape("a boolean")),
        Value::Number(_) => return Err(DecodeError::Shape("a number")),
        Value::String(_) => return Err(DecodeError::Shape("a string")),
    };

    let mut decoded = Decoded::default();

    for (index, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            decoded
                .rejected
                .push(InvalidRecord::new(index, None, InvalidReason::NotAnObject));
            continue;
        }

        let fallback_title = entry.get("TEACHING").and_then(Value::as_str).and_then(clean);
        let raw: RawLesson = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                let reason = InvalidReason::Malformed(e.to_string());
                tracing::warn!(index, %reason, "rejecting provider record");
                decoded
                    .rejected
                    .push(InvalidRecord::new(index, fallback_title.as_deref(), reason));
                continue;
            }
        };

        let title = raw.teaching.clone();
        match LessonRecord::try_from(raw) {
            Ok(lesson) => decoded.lessons.push((index, lesson)),
            Err(reason) => {
                tracing::warn!(index, %reason, "rejecting provider record");
                decoded
                    .rejected
                    .push(InvalidRecord::new(index, title.as_deref(), reason));
            }
        }
    }

    Ok(decoded)
}

/// Row keys are numeric indices in practice; order them numerically.
fn row_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
