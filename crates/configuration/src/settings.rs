use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; missing sections and keys fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub analytics: AnalyticsSettings,
}

/// Contains parameters for the HTTP API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// The IP address to bind to (e.g., "0.0.0.0").
    pub host: String,
    pub port: u16,
    /// Upper bound on request body size. Batches of predictions arrive in a single body.
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerSettings {
    /// Combines `host` and `port` into a socket address. `host` is a bare IPv4
    /// or IPv6 address, without brackets.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|e| {
            ConfigError::ValidationError(format!("invalid server host '{}': {}", self.host, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// How log lines are laid out on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Contains parameters for tracing output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set (e.g., "info" or "web_server=debug").
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

/// Contains parameters for the accuracy engine's outer surfaces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Page size for prediction listings that do not ask for one.
    pub default_page_limit: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            default_page_limit: 100,
        }
    }
}

impl Config {
    /// Checks constraints that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must not be 0".to_string()));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.body_limit_bytes must be greater than 0".to_string(),
            ));
        }
        if self.analytics.default_page_limit == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.default_page_limit must be greater than 0".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError("logging.level must not be empty".to_string()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}
