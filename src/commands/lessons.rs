use anyhow::Result;
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use tracing::debug;

use crate::provider::ProviderClient;
use crate::render::{Render, render_day, render_lesson};
use crate::utils::tui::create_spinner;

pub async fn run(client: &ProviderClient, teaching: &str, time_zone: &str) -> Result<()> {
    let tz: Tz = time_zone
        .parse()
        .map_err(|e| anyhow::anyhow!("Unknown time zone '{time_zone}': {e}"))?;

    let spinner = create_spinner(format!("Fetching lessons for {}", teaching.bold()));
    let schedule = client.lessons(teaching).await;
    let dataset_date = client.dataset_date().await;
    spinner.finish_and_clear();
    let schedule = schedule?;

    match dataset_date {
        Ok(date) => println!("{}", format!("Schedule data from {date}").dimmed()),
        Err(e) => debug!("dataset date unavailable: {e:#}"),
    }

    if schedule.is_empty() {
        println!("{}", "No lessons found".dimmed());
    }

    let mut current_day: Option<String> = None;
    for lesson in schedule.chronological(&tz) {
        let day = render_day(lesson, &tz);
        if current_day.as_ref() != Some(&day) {
            if current_day.is_some() {
                println!();
            }
            println!("{}", day.bold());
            current_day = Some(day);
        }
        println!("{}", render_lesson(lesson, &tz));
    }

    if !schedule.rejected().is_empty() {
        println!();
        for rejected in schedule.rejected() {
            println!("{}", rejected.render());
        }
    }

    Ok(())
}
