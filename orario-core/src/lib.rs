//! Core types for orario, a university course-schedule viewer.
//!
//! This crate turns lesson records from the Schedule Provider into an
//! iCalendar document:
//! - `lesson` decodes and validates provider records
//! - `schedule` carries a fetched collection until it is exported
//! - `ics` writes RFC 5545 output with time zone definitions
//!
//! Nothing here performs I/O.

pub mod error;
pub mod ics;
pub mod lesson;
pub mod schedule;

pub use error::{DecodeError, ExportError, ExportResult, InvalidReason, InvalidRecord};
pub use ics::{CalendarDocument, ExportOptions, ExportReport, TimeEncoding, export_schedule};
pub use lesson::{LessonRecord, LessonTime};
pub use schedule::Schedule;
