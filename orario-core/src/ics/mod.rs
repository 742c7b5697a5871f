//! iCalendar (.ics) generation.
//!
//! Documents are built with the icalendar crate, which handles CRLF line
//! endings, 75-octet folding and TEXT escaping.

mod generate;
mod timezone;

pub use generate::{
    CalendarDocument, DEFAULT_PRODUCT_ID, ExportOptions, ExportReport, ICS_FILENAME,
    ICS_MIME_TYPE, TimeEncoding, export_schedule, export_with_options,
};
pub use timezone::{Observance, SUPPORTED_ZONES, ZoneRules, rules_for};

pub(crate) use generate::export_entries;
