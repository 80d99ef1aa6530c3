//! Configuration management for the permtree server.
//!
//! Configuration is layered: hardcoded defaults, then an optional YAML file,
//! then environment variables. Environment variables use the `PERMTREE_`
//! prefix with `__` as the nested key separator, e.g.
//! `PERMTREE_SERVER__PORT=9090` or `PERMTREE_EXPAND__DEFAULT_DEPTH=25`.

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Network settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Expansion settings
    #[serde(default)]
    pub expand: ExpandSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Expansion settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ExpandSettings {
    /// Depth budget applied when a request carries no depth header
    #[serde(default = "default_depth")]
    pub default_depth: u16,
}

impl Default for ExpandSettings {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
        }
    }
}

fn default_depth() -> u16 {
    50
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Default log level if RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to emit JSON-formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Loads configuration from a YAML file with environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
            .add_source(Environment::with_prefix("PERMTREE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("PERMTREE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
