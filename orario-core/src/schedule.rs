//! In-memory schedule hand-off between fetching and exporting.
//!
//! A `Schedule` is built once from the provider's answer and handed to
//! whatever later renders or exports it. It lives as long as the caller
//! keeps it; nothing is stored globally.

use chrono_tz::Tz;

use crate::error::{DecodeError, ExportResult, InvalidRecord};
use crate::ics::{ExportOptions, ExportReport, export_entries};
use crate::lesson::{LessonRecord, decode_lessons};

#[derive(Debug, Clone)]
pub struct Schedule {
    course: String,
    lessons: Vec<(usize, LessonRecord)>,
    rejected: Vec<InvalidRecord>,
}

impl Schedule {
    pub fn new(course: impl Into<String>, lessons: Vec<LessonRecord>) -> Self {
        Schedule {
            course: course.into(),
            lessons: lessons.into_iter().enumerate().collect(),
            rejected: Vec::new(),
        }
    }

    /// Decode a provider payload, keeping malformed records aside.
    pub fn from_payload(course: impl Into<String>, json: &str) -> Result<Self, DecodeError> {
        let decoded = decode_lessons(json)?;

        Ok(Schedule {
            course: course.into(),
            lessons: decoded.lessons,
            rejected: decoded.rejected,
        })
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn lessons(&self) -> impl Iterator<Item = &LessonRecord> {
        self.lessons.iter().map(|(_, lesson)| lesson)
    }

    /// Records the provider sent that could not be decoded.
    pub fn rejected(&self) -> &[InvalidRecord] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Lessons ordered by start, as they would appear on a calendar.
    pub fn chronological(&self, tz: &Tz) -> Vec<&LessonRecord> {
        let mut lessons: Vec<&LessonRecord> = self.lessons().collect();
        lessons.sort_by_key(|lesson| {
            lesson
                .start
                .resolve(tz)
                .map(|dt| dt.naive_utc())
                .unwrap_or_else(|naive| naive)
        });
        lessons
    }

    /// Export every lesson in the schedule.
    ///
    /// The report's skipped list holds decoding and export failures alike,
    /// ordered by their position in the provider payload.
    pub fn export(&self, time_zone_id: &str, options: &ExportOptions) -> ExportResult<ExportReport> {
        let entries = self.lessons.iter().map(|(index, lesson)| (*index, lesson));
        let mut report = export_entries(entries, time_zone_id, options)?;

        if !self.rejected.is_empty() {
            report.skipped.extend(self.rejected.iter().cloned());
            report.skipped.sort_by_key(|invalid| invalid.index);
        }

        Ok(report)
    }
}
