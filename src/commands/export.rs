use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use orario_core::{ExportOptions, Schedule, TimeEncoding};
use owo_colors::OwoColorize;
use tracing::info;

use crate::config::OrarioConfig;
use crate::provider::ProviderClient;
use crate::render::render_report;
use crate::utils::tui::create_spinner;

/// Output flags shared by `export` and `convert`.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// File to write, or "-" for stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// IANA time zone the lesson times are given in (e.g. "Europe/Rome")
    #[arg(long)]
    pub zone: Option<String>,

    /// Write UTC times instead of local times with a VTIMEZONE
    #[arg(long)]
    pub utc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub output: PathBuf,
    pub time_zone: String,
    pub encoding: TimeEncoding,
}

impl ExportArgs {
    /// Flags win over the config file.
    pub fn settings(&self, config: &OrarioConfig) -> ExportSettings {
        ExportSettings {
            output: self.output.clone().unwrap_or_else(|| config.output_path()),
            time_zone: self.zone.clone().unwrap_or_else(|| config.time_zone.clone()),
            encoding: if self.utc { TimeEncoding::Utc } else { config.encoding },
        }
    }
}

pub async fn run(
    client: &ProviderClient,
    teaching: &str,
    settings: &ExportSettings,
    verbose: bool,
) -> Result<()> {
    let spinner = create_spinner(format!("Fetching lessons for {}", teaching.bold()));
    let schedule = client.lessons(teaching).await;
    spinner.finish_and_clear();
    let schedule = schedule?;

    if schedule.is_empty() && schedule.rejected().is_empty() {
        eprintln!("{}", format!("No lessons found for '{teaching}'").dimmed());
    }

    write_calendar(&schedule, Some(teaching.to_string()), settings, verbose)
}

/// Export a schedule and write the document where the settings say.
pub fn write_calendar(
    schedule: &Schedule,
    calendar_name: Option<String>,
    settings: &ExportSettings,
    verbose: bool,
) -> Result<()> {
    let options = ExportOptions {
        encoding: settings.encoding,
        calendar_name,
        ..ExportOptions::default()
    };

    let report = schedule
        .export(&settings.time_zone, &options)
        .with_context(|| format!("Could not export '{}'", schedule.course()))?;

    let to_stdout = settings.output == Path::new("-");
    if to_stdout {
        std::io::stdout()
            .lock()
            .write_all(report.document.as_str().as_bytes())
            .context("Could not write calendar to stdout")?;
    } else {
        std::fs::write(&settings.output, report.document.as_str())
            .with_context(|| format!("Could not write {}", settings.output.display()))?;
    }

    info!(
        course = schedule.course(),
        exported = report.exported,
        skipped = report.skipped.len(),
        output = %settings.output.display(),
        "calendar written"
    );

    // Keep stdout clean when it carries the calendar
    for line in render_report(&report, verbose) {
        if to_stdout {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
    if !to_stdout {
        println!("  Saved to {}", settings.output.display().bold());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orario_core::{LessonRecord, LessonTime};

    #[test]
    fn flags_override_config() {
        let config = OrarioConfig::default();
        let args = ExportArgs {
            output: Some(PathBuf::from("algorithms.ics")),
            zone: Some("Europe/Berlin".into()),
            utc: true,
        };

        assert_eq!(
            args.settings(&config),
            ExportSettings {
                output: PathBuf::from("algorithms.ics"),
                time_zone: "Europe/Berlin".into(),
                encoding: TimeEncoding::Utc,
            }
        );
    }

    #[test]
    fn config_fills_missing_flags() {
        let config = OrarioConfig {
            encoding: TimeEncoding::Utc,
            ..OrarioConfig::default()
        };
        let settings = ExportArgs::default().settings(&config);

        assert_eq!(settings.output, PathBuf::from("calendar.ics"));
        assert_eq!(settings.time_zone, "Europe/Rome");
        assert_eq!(settings.encoding, TimeEncoding::Utc);
    }

    #[test]
    fn writes_calendar_file_despite_skipped_lessons() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("calendar.ics");
        let schedule = Schedule::new(
            "Algorithms",
            vec![
                LessonRecord::new(
                    "Algorithms",
                    LessonTime::parse("2024-01-15T09:00:00").unwrap(),
                    LessonTime::parse("2024-01-15T11:00:00").unwrap(),
                ),
                LessonRecord::new(
                    "Algorithms",
                    LessonTime::parse("2024-01-16T11:00:00").unwrap(),
                    LessonTime::parse("2024-01-16T09:00:00").unwrap(),
                ),
            ],
        );
        let settings = ExportSettings {
            output: output.clone(),
            time_zone: "Europe/Rome".into(),
            encoding: TimeEncoding::Zoned,
        };

        write_calendar(&schedule, Some("Algorithms".into()), &settings, false).unwrap();

        let ics = std::fs::read_to_string(output).unwrap();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert!(ics.contains("X-WR-CALNAME:Algorithms\r\n"));
    }

    #[test]
    fn unsupported_zone_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ExportSettings {
            output: dir.path().join("calendar.ics"),
            time_zone: "Mars/Olympus".into(),
            encoding: TimeEncoding::Zoned,
        };

        let result = write_calendar(&Schedule::new("Empty", Vec::new()), None, &settings, false);
        assert!(result.is_err());
        assert!(!settings.output.exists());
    }
}
