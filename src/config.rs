use serde::Deserialize;

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{chat::DEFAULT_SUMMARY_NOTES, feed::DEFAULT_PAGE_SIZE};

pub const CONFIG_PATH_VAR: &str = "NEURALNOTE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {reason}")]
    Env { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// `None` keeps notes in memory for the lifetime of the process.
    #[serde(default)]
    pub database_dsn: Option<String>,
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// `None` (an explicit `null`) keeps the conversation in memory only.
    #[serde(default = "default_history_path")]
    pub history_path: Option<PathBuf>,
    #[serde(default = "default_summary_notes")]
    pub summary_note_count: usize,
}

const fn default_http_port() -> u16 {
    8000
}

fn default_owner_id() -> String {
    "local".to_string()
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_gateway_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "microsoft/mai-ds-r1:free".to_string()
}

fn default_history_path() -> Option<PathBuf> {
    Some(PathBuf::from("chat-messages.json"))
}

const fn default_summary_notes() -> usize {
    DEFAULT_SUMMARY_NOTES
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            api_key: String::new(),
            model: default_model(),
            timeout: None,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            summary_note_count: default_summary_notes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            database_dsn: None,
            owner_id: default_owner_id(),
            page_size: default_page_size(),
            gateway: GatewayConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Secrets are usually kept out of the config file; fill them from the environment.
    fn with_env_secrets(mut self) -> Self {
        if self.database_dsn.is_none() {
            self.database_dsn = env::var("PG_DSN").ok();
        }
        if self.gateway.api_key.is_empty() {
            self.gateway.api_key = env::var("OPENROUTER_API_KEY").unwrap_or_default();
        }
        self
    }
}

fn parse_env<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env::var(name).ok().map_or(Ok(None), |value| {
        value.parse().map(Some).map_err(|e: T::Err| ConfigError::Env {
            name,
            reason: e.to_string(),
        })
    })
}

fn load_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();

    if let Some(port) = parse_env("NEURALNOTE_PORT")? {
        config.http_port = port;
    }
    if let Some(owner_id) = parse_env("NEURALNOTE_OWNER_ID")? {
        config.owner_id = owner_id;
    }
    if let Some(page_size) = parse_env("NEURALNOTE_PAGE_SIZE")? {
        config.page_size = page_size;
    }
    if let Some(base_url) = parse_env("OPENROUTER_BASE_URL")? {
        config.gateway.base_url = base_url;
    }
    if let Some(model) = parse_env("OPENROUTER_MODEL")? {
        config.gateway.model = model;
    }
    if let Some(path) = parse_env::<String>("CHAT_HISTORY_PATH")? {
        config.chat.history_path = (!path.is_empty()).then(|| PathBuf::from(path));
    }

    Ok(config.with_env_secrets())
}

pub fn load_config() -> Result<Config, ConfigError> {
    // Retrieve env variable
    let config_path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        return Config::from_file(Path::new(&config_path)).map(Config::with_env_secrets);
    }

    // Fallback to config.example.yaml
    if Path::new("config.example.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.example.yaml'",
            config_path
        );
        return Config::from_file(Path::new("config.example.yaml")).map(Config::with_env_secrets);
    }

    // Fallback to environment variables
    tracing::info!(
        "No config file found, loading configuration from environment variables"
    );
    load_from_env()
}
