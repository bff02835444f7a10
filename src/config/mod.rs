/// Configuration management for centinela

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::Endpoint;

/// Main centinela configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sentinel quorum and data-plane connection settings
    pub sentinel: SentinelConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sentinel quorum and connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Logical dataset name the monitors track
    pub master_name: String,
    /// Monitor endpoints as "host:port", consulted in this order
    pub nodes: Vec<String>,
    /// Connect timeout in milliseconds, for monitors and replicas alike
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds, for monitors and replicas alike
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Sent as CLIENT SETNAME on write-path connections
    #[serde(default)]
    pub client_name: Option<String>,
    /// Data node password (AUTH)
    #[serde(default)]
    pub password: Option<String>,
    /// Monitor password, when the monitors require AUTH themselves
    #[serde(default)]
    pub sentinel_password: Option<String>,
    /// Logical database selected on data connections
    #[serde(default)]
    pub database: u32,
    /// COUNT hint passed to SCAN
    #[serde(default = "default_scan_count")]
    pub scan_count: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, text)
    pub format: String,
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

fn default_read_timeout_ms() -> u64 {
    2000
}

fn default_scan_count() -> u64 {
    // One page holds the whole keyspace unless the caller lowers this.
    i32::MAX as u64
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            master_name: "mymaster".to_string(),
            nodes: vec!["127.0.0.1:26379".to_string()],
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            client_name: None,
            password: None,
            sentinel_password: None,
            database: 0,
            scan_count: default_scan_count(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sentinel: SentinelConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SentinelConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Parse the configured monitor list, preserving order
    pub fn endpoints(&self) -> Result<Vec<Endpoint>, ConfigError> {
        self.nodes
            .iter()
            .map(|node| {
                node.parse::<Endpoint>().map_err(|e| {
                    ConfigError::ValidationError(format!("Invalid sentinel node {}: {}", node, e))
                })
            })
            .collect()
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sentinel = &self.sentinel;

        if sentinel.master_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "master_name cannot be empty".to_string(),
            ));
        }

        if sentinel.nodes.is_empty() {
            return Err(ConfigError::ValidationError(
                "sentinel nodes cannot be empty".to_string(),
            ));
        }
        sentinel.endpoints()?;

        if sentinel.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if sentinel.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "read_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if sentinel.scan_count == 0 {
            return Err(ConfigError::ValidationError(
                "scan_count must be greater than 0".to_string(),
            ));
        }

        if let Some(name) = &sentinel.client_name {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ConfigError::ValidationError(format!(
                    "client_name must be a non-empty word: {:?}",
                    name
                )));
            }
        }

        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.as_str() {
            "json" | "text" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }

    /// Create example configuration file
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let config = Config {
            sentinel: SentinelConfig {
                master_name: "mymaster".to_string(),
                nodes: vec![
                    "10.0.1.20:26379".to_string(),
                    "10.0.1.21:26379".to_string(),
                    "10.0.1.22:26379".to_string(),
                ],
                client_name: Some("centinela".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        config.save_to_file(path)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
