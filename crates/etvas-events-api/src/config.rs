//! Configuration types for the events service

use std::path::{Path, PathBuf};

use anyhow::Context;
use etvas_sdk::SdkConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ConfigError;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "ETVAS_CONFIG_FILE";

/// Prefix of environment overrides, e.g. `ETVAS__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "ETVAS";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Event endpoint settings
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Credentials and switches for the SDK core
    pub sdk: SdkConfig,
}

impl ServiceConfig {
    /// Configuration with default server, events and logging settings.
    pub fn new(sdk: SdkConfig) -> Self {
        Self {
            server: ServerConfig::default(),
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
            sdk,
        }
    }

    /// Check the settings that cannot be expressed through types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let path = &self.events.endpoint_path;
        if !path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!("events.endpoint_path must start with '/', got {:?}", path),
            });
        }
        if path == HEALTH_PATH {
            return Err(ConfigError::Invalid {
                message: format!("events.endpoint_path cannot be {}", HEALTH_PATH),
            });
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }
        self.sdk.validate()?;
        Ok(())
    }
}

pub(crate) const HEALTH_PATH: &str = "/health";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Event endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Path the platform posts events to
    pub endpoint_path: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/events".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Load the service configuration.
///
/// Sources, later ones overriding earlier ones:
///  1. `./config/etvas.{toml,yaml,json}` when present
///  2. `explicit_path`, or else the file named by `ETVAS_CONFIG_FILE`
///  3. Environment variables prefixed `ETVAS__` with `__` as separator,
///     e.g. `ETVAS__SDK__API_KEY`
pub fn load_config(explicit_path: Option<&Path>) -> anyhow::Result<ServiceConfig> {
    let mut builder =
        ::config::Config::builder().add_source(::config::File::with_name("config/etvas").required(false));

    let explicit = explicit_path.map(Path::to_path_buf).or_else(|| {
        std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    });
    if let Some(path) = explicit {
        info!(path = %path.display(), "Loading configuration from explicit path");
        builder = builder.add_source(::config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .context("Failed to build configuration")?;

    let service_config: ServiceConfig = settings
        .try_deserialize()
        .context("Could not deserialize service configuration")?;

    service_config
        .validate()
        .context("Service configuration is invalid")?;

    Ok(service_config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
