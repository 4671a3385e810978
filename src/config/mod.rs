use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Used for destinations stored with `timeout_ms = 0`.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Upper bound on any single destination's timeout, and so on the whole dispatch.
    #[serde(default = "default_ceiling_ms")]
    pub ceiling_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum number of characters kept from a destination's response body.
    #[serde(default = "default_body_snippet_len")]
    pub body_snippet_len: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            ceiling_ms: default_ceiling_ms(),
            user_agent: default_user_agent(),
            body_snippet_len: default_body_snippet_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Days of delivery history to keep (0 = keep forever)
    #[serde(default)]
    pub retention_days: u32,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            retention_days: 0,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "./data/hookrelay.db".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_ceiling_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("hookrelay/{}", env!("CARGO_PKG_VERSION"))
}

fn default_body_snippet_len() -> usize {
    1000
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run 'hookrelay init' to create one.",
                path.display(),
                e
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }
        if self.dispatch.default_timeout_ms == 0 {
            anyhow::bail!("dispatch.default_timeout_ms must be greater than 0");
        }
        if self.dispatch.ceiling_ms < self.dispatch.default_timeout_ms {
            anyhow::bail!(
                "dispatch.ceiling_ms ({}) must be at least dispatch.default_timeout_ms ({})",
                self.dispatch.ceiling_ms,
                self.dispatch.default_timeout_ms
            );
        }
        if self.logs.default_page_size == 0 {
            anyhow::bail!("logs.default_page_size must be greater than 0");
        }
        if self.logs.max_page_size < self.logs.default_page_size {
            anyhow::bail!("logs.max_page_size must be at least logs.default_page_size");
        }
        Ok(())
    }
}
