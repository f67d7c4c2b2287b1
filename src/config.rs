use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    /// Run with the override directory after every save or delete.
    /// Empty disables it.
    #[serde(default = "default_refresh_command")]
    pub refresh_command: String,
    /// Prefix for entries with Terminal=true, e.g. "foot -e".
    #[serde(default)]
    pub terminal: Option<String>,
}

fn default_refresh_command() -> String { "update-desktop-database".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_command: default_refresh_command(),
            terminal: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LaunchConfig {
    /// Extra environment for test runs.
    pub env: Option<HashMap<String, String>>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }
}

pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("org", "deskedit", "deskedit")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    Config::from_toml(&content).with_context(|| format!("parsing {}", config_path.display()))
}
