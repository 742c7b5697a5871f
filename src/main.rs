mod commands;
mod config;
mod provider;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::export::ExportArgs;
use crate::config::OrarioConfig;
use crate::provider::ProviderClient;

#[derive(Parser)]
#[command(name = "orario", version)]
#[command(about = "Browse university lesson schedules and export them to your calendar")]
struct Cli {
    /// Schedule provider URL (overrides backend_url from the config)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// List every skipped lesson
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the teachings offered for a site, degree type and cycle
    Teachings {
        #[arg(long)]
        location: String,

        #[arg(long)]
        degree_type: String,

        #[arg(long)]
        cycle: String,
    },
    /// Show the lessons of a teaching, day by day
    Lessons {
        teaching: String,

        /// IANA time zone the lesson times are given in
        #[arg(long)]
        zone: Option<String>,
    },
    /// Fetch a teaching's lessons and write them to an .ics file
    Export {
        teaching: String,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Turn a saved provider payload into an .ics file
    Convert {
        /// Payload file, or "-" for stdin
        input: PathBuf,

        /// Calendar name shown by calendar applications
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Show where the configuration lives and what it resolves to
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = OrarioConfig::load()?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }

    match cli.command {
        Commands::Teachings {
            location,
            degree_type,
            cycle,
        } => {
            let client = ProviderClient::new(&config.backend_url)?;
            commands::teachings::run(&client, &location, &degree_type, &cycle).await
        }
        Commands::Lessons { teaching, zone } => {
            let client = ProviderClient::new(&config.backend_url)?;
            let zone = zone.unwrap_or_else(|| config.time_zone.clone());
            commands::lessons::run(&client, &teaching, &zone).await
        }
        Commands::Export { teaching, export } => {
            let client = ProviderClient::new(&config.backend_url)?;
            let settings = export.settings(&config);
            commands::export::run(&client, &teaching, &settings, cli.verbose).await
        }
        Commands::Convert {
            input,
            name,
            export,
        } => {
            let settings = export.settings(&config);
            commands::convert::run(&input, name, &settings, cli.verbose)
        }
        Commands::Config => commands::config::run(&config),
    }
}
