use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Listen address used when nothing else is configured.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Base name of the optional config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "error-server";

/// Prefix for environment overrides, e.g. `ERROR_SERVER__ADDR`.
pub const ENV_PREFIX: &str = "ERROR_SERVER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the default backend listens on.
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    DEFAULT_ADDR.to_string()
}

/// Load server configuration from an optional YAML file + environment overrides.
///
/// With no explicit `path`, `error-server.yaml` in the working directory is
/// used when present. Environment variables prefixed with `ERROR_SERVER__`
/// override file values.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    use config::{Config, Environment, File};
    let builder = Config::builder().set_default("addr", DEFAULT_ADDR)?;
    let builder = match path {
        Some(path) => builder.add_source(File::from(path)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
    };
    let cfg = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let server: ServerConfig = cfg.try_deserialize()?;
    server.validate()?;
    Ok(server)
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addr.trim().is_empty() {
            return Err(ConfigError::Validation("addr must not be empty".into()));
        }
        if !self.addr.contains(':') {
            return Err(ConfigError::Validation(format!(
                "addr must be host:port, got {:?}",
                self.addr
            )));
        }
        Ok(())
    }
}
