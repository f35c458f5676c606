//! On-disk configuration: agent catalog, MCP servers, and app settings.
//!
//! The document is JSON at the platform user-config directory under
//! `bytesmith/config.json`. A missing file is not an error: the default
//! configuration is written to disk and returned, so a fresh install starts
//! with the well-known agent catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, Result};

/// Configuration for a single ACP agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Short unique token used to select the agent.
    pub name: String,
    pub display_name: String,
    /// Binary to spawn.
    pub command: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub auto_detect: bool,
}

/// An MCP server that can be attached to sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Application-wide preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: String,
    pub default_agent: String,
    pub default_cwd: String,
    pub auto_approve: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_owned(),
            default_agent: "opencode".to_owned(),
            default_cwd: String::new(),
            auto_approve: false,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agents: Vec<AgentConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerConfig>,
    pub settings: AppSettings,
}

impl Config {
    /// Look up an agent by name.
    #[must_use]
    pub fn find_agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.name == name)
    }
}

/// Default configuration path:
/// `<platform config dir>/bytesmith/config.json`.
#[must_use]
pub fn config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(".config")
    });
    base.join("bytesmith").join("config.json")
}

/// Default configuration: the well-known agent catalog plus default
/// settings.
#[must_use]
pub fn default_config() -> Config {
    Config {
        agents: crate::agent::discovery::well_known_agents(),
        mcp_servers: Vec::new(),
        settings: AppSettings::default(),
    }
}

/// Read the configuration from `path`. If the file does not exist, the
/// default configuration is written to disk and returned.
///
/// # Errors
///
/// Returns `AppError::Config` when the file exists but cannot be read or
/// parsed, or when writing the default fails.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config missing, writing defaults");
            let cfg = default_config();
            save_config(path, &cfg)?;
            return Ok(cfg);
        }
        Err(err) => {
            return Err(AppError::Config(format!(
                "cannot read config file '{}': {err}",
                path.display()
            )))
        }
    };

    serde_json::from_str(&raw)
        .map_err(|err| AppError::Config(format!("invalid config '{}': {err}", path.display())))
}

/// Write the configuration to `path`, creating parent directories as
/// needed. The document is pretty-printed for hand editing.
///
/// # Errors
///
/// Returns `AppError::Config` on serialization or write failure.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|err| AppError::Config(format!("create config dir: {err}")))?;
    }

    let data = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::Config(format!("marshal config: {err}")))?;

    std::fs::write(path, data)
        .map_err(|err| AppError::Config(format!("write config '{}': {err}", path.display())))
}
