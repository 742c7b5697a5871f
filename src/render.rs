//! TUI rendering traits for orario types.
//!
//! Extension traits that add colored terminal rendering to orario-core
//! types using owo_colors.

use chrono_tz::Tz;
use orario_core::{ExportReport, InvalidRecord, LessonRecord};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for InvalidRecord {
    fn render(&self) -> String {
        format!("{} {}", "!".yellow(), self.to_string().dimmed())
    }
}

/// Number of skipped records listed one by one before collapsing
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Lines printed after an export.
pub fn render_report(report: &ExportReport, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{} Exported {}",
        "✓".green(),
        pluralize(report.exported, "lesson")
    )];

    if report.skipped.is_empty() {
        return lines;
    }

    let skipped = report.skipped.len();
    let verb = if skipped == 1 { "was" } else { "were" };
    lines.push(
        format!(
            "{} {verb} skipped because of invalid data",
            pluralize(skipped, "lesson")
        )
        .yellow()
        .to_string(),
    );

    if verbose || skipped <= COMPACT_THRESHOLD {
        lines.extend(report.skipped.iter().map(|s| format!("   {}", s.render())));
    } else {
        lines.push("   (run with --verbose to list them)".dimmed().to_string());
    }

    lines
}

/// Render a lesson as one line of a day-grouped listing.
pub fn render_lesson(lesson: &LessonRecord, tz: &Tz) -> String {
    let start = lesson.start.resolve(tz).map(|dt| dt.naive_local());
    let end = lesson.end.resolve(tz).map(|dt| dt.naive_local());

    let time = match (start, end) {
        (Ok(start), Ok(end)) => format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
        _ => "??:??".red().to_string(),
    };

    let place = [&lesson.classroom_name, &lesson.location_name]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!("  {time} {}", lesson.title);
    if !place.is_empty() {
        line.push_str(&format!(" {}", format!("[{place}]").dimmed()));
    }
    if let Some(lecturer) = &lesson.lecturer_name {
        line.push_str(&format!(" {}", lecturer.dimmed()));
    }
    line
}

/// Day heading such as "Mon Jan 15 2024", for the lesson's start in `tz`.
pub fn render_day(lesson: &LessonRecord, tz: &Tz) -> String {
    let start = lesson
        .start
        .resolve(tz)
        .map(|dt| dt.naive_local())
        .unwrap_or_else(|naive| naive);
    start.format("%a %b %-d %Y").to_string()
}
