//! Configuration management for StockPicker
//!
//! Loads project, agent and search settings from `~/.stockpicker/config.json`,
//! with deployment environment variables layered on top.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod connection;
pub mod paths;

pub use connection::ConnectionString;
pub use paths::{config_path, data_dir, reports_dir};

pub const PROJECT_CONNECTION_STRING_VAR: &str = "PROJECT_CONNECTION_STRING";
pub const MODEL_DEPLOYMENT_VAR: &str = "AGENTS_MODEL_DEPLOYMENT_NAME";
pub const AGENTS_API_KEY_VAR: &str = "AGENTS_API_KEY";
pub const SEARCH_ENDPOINT_VAR: &str = "VECTOR_SEARCH_ENDPOINT";
pub const SEARCH_API_KEY_VAR: &str = "VECTOR_SEARCH_API_KEY";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("◆ CONFIG IO ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("◆ CONFIG PARSE ERROR: {0}")]
    Json(#[from] serde_json::Error),

    #[error("◆ MISSING SETTING: {0}")]
    Missing(&'static str),

    #[error("◆ INVALID CONNECTION STRING: {0:?}")]
    InvalidConnectionString(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Agent-hosting project access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub connection_string: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            api_key: String::new(),
            api_version: default_api_version(),
        }
    }
}

fn default_api_version() -> String {
    "2024-07-01-preview".to_string()
}

/// Agent run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: String::new(),
            name: default_agent_name(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_agent_name() -> String {
    "StockPickerPro".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_polls() -> u32 {
    600
}

/// Vector search backend used by the `vector_search` tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_top")]
    pub top: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            top: default_top(),
        }
    }
}

fn default_top() -> u32 {
    10
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub agent: AgentDefaults,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ NO CONFIG AT {:?}, USING DEFAULTS", path);
            return Ok(Config::default());
        }

        debug!("◆ READING CONFIG FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ WRITING CONFIG TO {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Overlay deployment environment variables
    pub fn apply_env(&mut self) {
        self.apply_lookup(|name| std::env::var(name).ok());
    }

    /// Overlay values from any variable source; empty values are ignored
    pub fn apply_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(PROJECT_CONNECTION_STRING_VAR) {
            self.project.connection_string = value;
        }
        if let Some(value) = get(MODEL_DEPLOYMENT_VAR) {
            self.agent.model = value;
        }
        if let Some(value) = get(AGENTS_API_KEY_VAR) {
            self.project.api_key = value;
        }
        if let Some(value) = get(SEARCH_ENDPOINT_VAR) {
            self.search.endpoint = value;
        }
        if let Some(value) = get(SEARCH_API_KEY_VAR) {
            self.search.api_key = value;
        }
    }

    /// Parsed project connection, required to reach the agent service
    pub fn connection(&self) -> Result<ConnectionString> {
        if self.project.connection_string.trim().is_empty() {
            return Err(ConfigError::Missing(PROJECT_CONNECTION_STRING_VAR));
        }
        ConnectionString::parse(&self.project.connection_string)
    }

    /// Check everything needed for an analysis run is present
    pub fn require_project(&self) -> Result<()> {
        self.connection()?;
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::Missing(MODEL_DEPLOYMENT_VAR));
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.project.api_key.is_empty()
    }

    pub fn has_search(&self) -> bool {
        !self.search.endpoint.is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.agent.poll_interval_ms)
    }
}

/// Write a default config and create the reports directory
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ CONFIG ALREADY EXISTS AT {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ CONFIG CREATED AT {:?}", config_path);
    }

    let reports = reports_dir();
    paths::ensure_dir(&reports).await?;
    info!("◆ REPORTS DIRECTORY READY AT {:?}", reports);

    Config::load().await
}
