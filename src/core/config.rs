//! Configuration management for dnstally.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by [`crate::cli`])
//! - Validation and defaults

use crate::core::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Complete configuration for dnstally
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Statistics engine configuration
    pub stats: StatsConfig,
    /// Prometheus exporter configuration
    pub exporter: ExporterConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the stats API
    pub bind_address: IpAddr,
    /// Port for the stats API
    pub port: u16,
    /// Enable CORS headers
    pub enable_cors: bool,
}

/// Statistics engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// How often the rotation driver ages the buckets
    #[serde(with = "humantime_serde")]
    pub rotation_interval: Duration,
}

/// Exporter naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Metric namespace prefix
    pub namespace: String,
    /// Metric subsystem prefix
    pub subsystem: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Structured logging format
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            stats: StatsConfig::default(),
            exporter: ExporterConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            enable_cors: true,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            rotation_interval: Duration::from_secs(1),
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        ExporterConfig {
            namespace: "coredns".to_string(),
            subsystem: "dnsfilter".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl ServerConfig {
    /// Socket address the API listens on
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stats.rotation_interval.is_zero() {
            return Err(StatsError::config("rotation_interval must be greater than 0"));
        }

        // Per-second buckets would age late with a slower driver.
        if self.stats.rotation_interval > Duration::from_secs(1) {
            return Err(StatsError::config(format!(
                "rotation_interval must be at most 1s, got {:?}",
                self.stats.rotation_interval
            )));
        }

        if !is_metric_identifier(&self.exporter.namespace) {
            return Err(StatsError::config(format!(
                "Invalid exporter namespace '{}'",
                self.exporter.namespace
            )));
        }

        if !is_metric_identifier(&self.exporter.subsystem) {
            return Err(StatsError::config(format!(
                "Invalid exporter subsystem '{}'",
                self.exporter.subsystem
            )));
        }

        Ok(())
    }

    /// Effective log level, raised to debug when debug mode is on
    pub fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            self.logging.level
        }
    }
}

/// Prometheus identifiers: `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_metric_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| StatsError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set API port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set API bind address
    pub fn bind_address(mut self, address: IpAddr) -> Self {
        self.config.server.bind_address = address;
        self
    }

    /// Set rotation interval
    pub fn rotation_interval(mut self, interval: Duration) -> Self {
        self.config.stats.rotation_interval = interval;
        self
    }

    /// Set exporter namespace
    pub fn namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.config.exporter.namespace = namespace.into();
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
