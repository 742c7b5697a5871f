use anyhow::Result;
use owo_colors::OwoColorize;

use crate::provider::ProviderClient;
use crate::utils::tui::create_spinner;

pub async fn run(
    client: &ProviderClient,
    location: &str,
    degree_type: &str,
    cycle: &str,
) -> Result<()> {
    let spinner = create_spinner("Fetching teachings".to_string());
    let teachings = client.teachings(location, degree_type, cycle).await;
    spinner.finish_and_clear();
    let teachings = teachings?;

    if teachings.is_empty() {
        println!(
            "{}",
            format!("No teachings for {location} / {degree_type} / {cycle}").dimmed()
        );
        return Ok(());
    }

    for teaching in &teachings {
        println!("  {teaching}");
    }
    println!(
        "{}",
        format!("{} teachings", teachings.len()).dimmed()
    );

    Ok(())
}
