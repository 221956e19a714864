use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Units;

pub const DEFAULT_API_BASE: &str = "https://api.openweathermap.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// units = "metric"
/// dark_mode = false
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub units: Units,
    pub dark_mode: bool,

    /// Override for the provider host, e.g. a local proxy.
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::default(),
            dark_mode: false,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Returns the API key or a hint on how to configure one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `cityweather configure` and enter your OpenWeather API key."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    /// Flips the dark-mode preference and returns the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding persisted client state (pinned cities).
    pub fn data_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "cityweather", "cityweather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
