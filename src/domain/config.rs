//! # Configuration
//!
//! Main application configuration structure.
//! Matches the layout of `config.yaml`; every section has defaults so a
//! missing file still yields a runnable bot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
    /// Optional file sink for the tracing subscriber.
    #[serde(default)]
    pub log_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    /// Auth token handed to the chat transport. The console transport
    /// ignores it; real backends require it.
    #[serde(default)]
    pub token: String,
    /// Id used in the mention prefix and the self-message filter.
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            user_id: default_user_id(),
        }
    }
}

fn default_user_id() -> String {
    "minibot".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PluginsConfig {
    /// Directory scanned for loadable plugin artifacts. Must exist, even
    /// if empty.
    #[serde(default = "default_plugin_dir")]
    pub dir: PathBuf,
    /// Plugin names to skip before loading.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Deadline for a single command execution.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            dir: default_plugin_dir(),
            disabled: Vec::new(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

fn default_plugin_dir() -> PathBuf {
    PathBuf::from("./plugins")
}

fn default_command_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Load from a YAML file. A missing file falls back to defaults; a
    /// present but unreadable or invalid file is a startup error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}
