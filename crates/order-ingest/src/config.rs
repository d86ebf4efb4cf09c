//! Configuration loading for the order-ingest service.
//!
//! Every field is required; there are no defaults. The file path comes from `--config <path>`
//! or `ORDER_INGEST_CONFIG`. See `config.example.toml` next to the crate manifest.

use ingest_framework::logging::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub cache: CacheConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub topic: String,
    pub topic_dlq: String,
    pub group_id: String,
    /// Read from the beginning of the topic when the group has no committed offset.
    pub first_offset: bool,
    pub publish_interval_ms: u64,
    pub poll_batch: usize,
    pub poll_retry_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or ORDER_INGEST_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        not_empty("server.host", &self.server.host)?;
        if self.server.port == 0 {
            return Err(invalid("server.port", "must be > 0"));
        }
        not_empty("broker.topic", &self.broker.topic)?;
        not_empty("broker.topic_dlq", &self.broker.topic_dlq)?;
        not_empty("broker.group_id", &self.broker.group_id)?;
        if self.broker.topic == self.broker.topic_dlq {
            return Err(invalid("broker.topic_dlq", "must differ from broker.topic"));
        }
        positive("broker.publish_interval_ms", self.broker.publish_interval_ms)?;
        positive("broker.poll_batch", self.broker.poll_batch as u64)?;
        positive("broker.poll_retry_ms", self.broker.poll_retry_ms)?;
        positive("cache.size", self.cache.size as u64)?;
        positive("health.interval_ms", self.health.interval_ms)?;
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(invalid("logging.level", format!("must be one of {}", LEVELS.join(", "))));
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl BrokerConfig {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn poll_retry(&self) -> Duration {
        Duration::from_millis(self.poll_retry_ms)
    }
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn not_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field, "must be > 0"));
    }
    Ok(())
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("ORDER_INGEST_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
