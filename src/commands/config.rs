use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::OrarioConfig;

pub fn run(config: &OrarioConfig) -> Result<()> {
    let config_path = OrarioConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!("  Output:  {}", config.output_path().display());
    println!();
    println!("{}", "Effective settings".bold());
    for line in config.to_toml()?.lines() {
        println!("  {line}");
    }

    Ok(())
}
