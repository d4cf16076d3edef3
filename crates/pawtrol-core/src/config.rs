use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (pawtrol.toml + PAWTROL_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PawtrolConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Absent when no bot token is configured; the Telegram channel then
    /// reports itself permanently unavailable instead of failing startup.
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Polling period of the notification loop, in seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    /// Run one overdue sweep when the daemon starts. Off by default: the
    /// sweep re-sends every match on every invocation.
    #[serde(default)]
    pub sweep_on_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_secs: default_poll_secs(),
            sweep_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

fn default_poll_secs() -> u64 {
    60
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pawtrol/pawtrol.db", home)
}

impl PawtrolConfig {
    /// Load config from a TOML file with PAWTROL_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.pawtrol/pawtrol.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: PawtrolConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("PAWTROL_").split("_"))
            .extract()
            .map_err(|e| crate::error::PawtrolError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pawtrol/pawtrol.toml", home)
}
