use std::path::Path;

use anyhow::{Context, Result};
use orario_core::Schedule;

use super::export::{ExportSettings, write_calendar};

/// Export a provider payload saved to disk (or piped in with "-").
pub fn run(
    input: &Path,
    name: Option<String>,
    settings: &ExportSettings,
    verbose: bool,
) -> Result<()> {
    let payload = read_payload(input)?;

    let course = name.clone().unwrap_or_else(|| {
        input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| *stem != "-")
            .unwrap_or("lessons")
            .to_string()
    });

    let schedule = Schedule::from_payload(course, &payload)
        .with_context(|| format!("{} is not a lesson payload", input.display()))?;

    write_calendar(&schedule, name, settings, verbose)
}

fn read_payload(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Could not read payload from stdin")
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Could not read {}", input.display()))
    }
}
