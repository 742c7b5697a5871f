//! User configuration at ~/.config/orario/config.toml, overridable with
//! `ORARIO_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use orario_core::TimeEncoding;
use serde::{Deserialize, Serialize};

static DEFAULT_BACKEND_URL: &str = "http://localhost:8081";
static DEFAULT_TIME_ZONE: &str = "Europe/Rome";
static DEFAULT_OUTPUT: &str = orario_core::ics::ICS_FILENAME;

const ENV_PREFIX: &str = "ORARIO";

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrarioConfig {
    /// Schedule provider base URL
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// IANA zone lesson times are expressed in
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    #[serde(default)]
    pub encoding: TimeEncoding,

    /// Where `export` and `convert` write when no `-o` is given
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for OrarioConfig {
    fn default() -> Self {
        OrarioConfig {
            backend_url: default_backend_url(),
            time_zone: default_time_zone(),
            encoding: TimeEncoding::default(),
            output: default_output(),
        }
    }
}

impl OrarioConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("orario");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, creating a commented default on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::from_sources(&config_path, Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources(path: &Path, env: Environment) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("Could not read config file {}", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// `output` with a leading `~` expanded.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output.to_string_lossy()).into_owned())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Could not serialize configuration")
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# orario configuration

# Schedule provider the lessons are fetched from:
# backend_url = \"{DEFAULT_BACKEND_URL}\"

# Time zone lesson times are given in:
# time_zone = \"{DEFAULT_TIME_ZONE}\"

# How event times are written, \"zoned\" (TZID + VTIMEZONE) or \"utc\":
# encoding = \"zoned\"

# Default file for exported calendars:
# output = \"{DEFAULT_OUTPUT}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Could not write config file {}", path.display()))?;

        Ok(())
    }
}
