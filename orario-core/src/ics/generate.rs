//! Schedule-to-iCalendar export.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::timezone::{ExportZone, strip_vtimezone_stamps};
use crate::error::{ExportResult, InvalidReason, InvalidRecord};
use crate::lesson::LessonRecord;

/// Suggested file name for a downloaded export.
pub const ICS_FILENAME: &str = "calendar.ics";

/// MIME type to serve an export with.
pub const ICS_MIME_TYPE: &str = "text/calendar;charset=utf-8";

pub const DEFAULT_PRODUCT_ID: &str = "-//orario//Lesson Export//EN";

/// Domain part of generated UIDs
const UID_DOMAIN: &str = "orario";

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// How DTSTART/DTEND are written. One encoding per document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeEncoding {
    /// `DTSTART;TZID=Europe/Rome:20240115T090000`, with a VTIMEZONE block
    #[default]
    Zoned,
    /// `DTSTART:20240115T080000Z`
    Utc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub encoding: TimeEncoding,
    pub product_id: String,
    /// Written as X-WR-CALNAME when set
    pub calendar_name: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            encoding: TimeEncoding::Zoned,
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            calendar_name: None,
        }
    }
}

/// A complete iCalendar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument(String);

impl CalendarDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of VEVENT blocks in the document.
    pub fn event_count(&self) -> usize {
        self.0.lines().filter(|l| *l == "BEGIN:VEVENT").count()
    }
}

impl AsRef<str> for CalendarDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The exported document together with every lesson left out of it.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub document: CalendarDocument,
    pub exported: usize,
    pub skipped: Vec<InvalidRecord>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Export lessons in `time_zone_id` with default options.
pub fn export_schedule(lessons: &[LessonRecord], time_zone_id: &str) -> ExportResult<ExportReport> {
    export_with_options(lessons, time_zone_id, &ExportOptions::default())
}

/// Export lessons in `time_zone_id`.
///
/// Lessons that fail validation are left out and listed in the report; only
/// an unusable time zone fails the export as a whole.
pub fn export_with_options(
    lessons: &[LessonRecord],
    time_zone_id: &str,
    options: &ExportOptions,
) -> ExportResult<ExportReport> {
    export_entries(lessons.iter().enumerate(), time_zone_id, options)
}

/// Export lessons tagged with their position in the caller's collection.
pub(crate) fn export_entries<'a>(
    entries: impl IntoIterator<Item = (usize, &'a LessonRecord)>,
    time_zone_id: &str,
    options: &ExportOptions,
) -> ExportResult<ExportReport> {
    let zone = match options.encoding {
        TimeEncoding::Zoned => ExportZone::for_zoned(time_zone_id)?,
        TimeEncoding::Utc => ExportZone::for_utc(time_zone_id)?,
    };

    let mut calendar = Calendar::empty();
    calendar.append_property(Property::new("VERSION", "2.0"));
    calendar.append_property(Property::new("PRODID", plain_text(&options.product_id)));
    calendar.append_property(Property::new("CALSCALE", "GREGORIAN"));
    calendar.append_property(Property::new("METHOD", "PUBLISH"));
    if let Some(name) = &options.calendar_name {
        calendar.append_property(Property::new("X-WR-CALNAME", plain_text(name)));
    }
    if options.encoding == TimeEncoding::Zoned {
        calendar.append_property(Property::new("X-WR-TIMEZONE", zone.tzid.as_str()));
        if let Some(vtimezone) = zone.vtimezone() {
            calendar.push(vtimezone);
        }
    }

    let mut uids = UidAllocator::default();
    let mut exported = 0;
    let mut skipped = Vec::new();

    for (index, lesson) in entries {
        match resolve(index, lesson, &zone.tz) {
            Ok(resolved) => {
                let uid = uids.allocate(&resolved);
                calendar.push(build_event(&resolved, &uid, &zone, options.encoding));
                tracing::debug!(index, %uid, title = %lesson.title, "exported lesson");
                exported += 1;
            }
            Err(invalid) => {
                tracing::warn!(index, reason = %invalid.reason, "skipping lesson");
                skipped.push(invalid);
            }
        }
    }

    Ok(ExportReport {
        document: CalendarDocument(strip_vtimezone_stamps(&calendar.to_string())),
        exported,
        skipped,
    })
}

/// A lesson whose times have been pinned to the export zone.
struct ResolvedLesson<'a> {
    lesson: &'a LessonRecord,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

fn resolve<'a>(index: usize, lesson: &'a LessonRecord, tz: &Tz) -> Result<ResolvedLesson<'a>, InvalidRecord> {
    let title = lesson.title.trim();
    let invalid = |reason| InvalidRecord::new(index, (!title.is_empty()).then_some(title), reason);

    if title.is_empty() {
        return Err(invalid(InvalidReason::MissingField("title")));
    }

    let start = lesson
        .start
        .resolve(tz)
        .map_err(|naive| invalid(InvalidReason::NonexistentLocalTime(naive)))?;
    let end = lesson
        .end
        .resolve(tz)
        .map_err(|naive| invalid(InvalidReason::NonexistentLocalTime(naive)))?;

    if start >= end {
        return Err(invalid(InvalidReason::EndNotAfterStart {
            start: start.naive_local(),
            end: end.naive_local(),
        }));
    }

    Ok(ResolvedLesson { lesson, start, end })
}

/// Hands out stable UIDs derived from lesson content.
///
/// Identical lessons in the same export get an occurrence suffix so every
/// VEVENT keeps a distinct UID.
#[derive(Default)]
struct UidAllocator {
    seen: HashSet<String>,
}

impl UidAllocator {
    fn allocate(&mut self, resolved: &ResolvedLesson<'_>) -> String {
        let lesson = resolved.lesson;
        // JSON keeps field boundaries unambiguous whatever the fields contain
        let seed = serde_json::json!([
            lesson.title.trim(),
            resolved.start.with_timezone(&Utc).format(UTC_FORMAT).to_string(),
            resolved.end.with_timezone(&Utc).format(UTC_FORMAT).to_string(),
            lesson.classroom_name.as_deref().unwrap_or_default(),
        ])
        .to_string();

        let mut candidate = seed.clone();
        let mut occurrence = 0;
        while !self.seen.insert(candidate.clone()) {
            occurrence += 1;
            candidate = format!("{seed}#{occurrence}");
        }

        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, candidate.as_bytes());
        format!("{id}@{UID_DOMAIN}")
    }
}

fn build_event(
    resolved: &ResolvedLesson<'_>,
    uid: &str,
    zone: &ExportZone,
    encoding: TimeEncoding,
) -> icalendar::Event {
    let lesson = resolved.lesson;

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(uid);
    // DTSTAMP follows the lesson start, never the wall clock
    let dtstamp = resolved.start.with_timezone(&Utc).format(UTC_FORMAT).to_string();
    ics_event.add_property("DTSTAMP", &dtstamp);
    add_datetime_property(&mut ics_event, "DTSTART", &resolved.start, zone, encoding);
    add_datetime_property(&mut ics_event, "DTEND", &resolved.end, zone, encoding);
    ics_event.summary(&plain_text(lesson.title.trim()));
    ics_event.description(&plain_text(&describe(lesson)));
    ics_event.location(&plain_text(&location(lesson)));

    // URL has no empty form; fall back to the lecturer page
    let url = [&lesson.detail_url, &lesson.lecturer_url]
        .into_iter()
        .filter_map(|candidate| candidate.as_deref().and_then(absolute_url))
        .next();
    if let Some(url) = url {
        ics_event.add_property("URL", url.as_str());
    }

    ics_event.done()
}

fn add_datetime_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    time: &DateTime<Tz>,
    zone: &ExportZone,
    encoding: TimeEncoding,
) {
    match encoding {
        TimeEncoding::Zoned => {
            let mut prop = Property::new(name, time.format(LOCAL_FORMAT).to_string());
            prop.add_parameter("TZID", &zone.tzid);
            ics_event.append_property(prop);
        }
        TimeEncoding::Utc => {
            let utc = time.with_timezone(&Utc).format(UTC_FORMAT).to_string();
            ics_event.add_property(name, utc);
        }
    }
}

/// Text as icalendar should see it: one newline form and no other control
/// characters, so escaping leaves no raw line break behind.
fn plain_text(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| matches!(c, '\n' | '\t') || !c.is_control())
        .collect()
}

/// Multi-line human-readable summary of the lesson's details.
fn describe(lesson: &LessonRecord) -> String {
    let fields = [
        ("Lecturer", &lesson.lecturer_name),
        ("Lecturer page", &lesson.lecturer_url),
        ("Classroom", &lesson.classroom_name),
        ("Location", &lesson.location_name),
        ("Address", &lesson.address),
        ("Credits", &lesson.credits),
        ("Details", &lesson.detail_url),
    ];

    fields
        .iter()
        .filter_map(|(label, value)| present(value).map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn location(lesson: &LessonRecord) -> String {
    [&lesson.classroom_name, &lesson.location_name, &lesson.address]
        .into_iter()
        .filter_map(present)
        .collect::<Vec<_>>()
        .join(" - ")
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Only absolute http(s) links make it into URL properties.
fn absolute_url(s: &str) -> Option<Url> {
    Url::parse(s.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}
