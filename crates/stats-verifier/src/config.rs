use crate::bigquery::client::DEFAULT_ENDPOINT;
use crate::cluster::{TECTONIC_CONFIG_MAP, TECTONIC_SYSTEM_NAMESPACE};
use crate::logs::{STATS_EMITTER_POD_PREFIX, SUCCESS_MARKER};
use crate::poll::{BIGQUERY_POLL_INTERVAL, DEFAULT_TIMEOUT, LOGS_POLL_INTERVAL, PollStrategy};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Base name of the optional config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stats-verifier";

/// Prefix for environment overrides, e.g. `STATS_VERIFIER__TIMEOUT=2m`.
pub const ENV_PREFIX: &str = "STATS_VERIFIER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

#[derive(Clone, Debug, Deserialize)]
pub struct VerifierConfig {
    /// Namespace holding the stats emitter and the cluster config map.
    pub namespace: String,
    pub config_map: String,
    pub pod_prefix: String,
    pub success_marker: String,
    /// Upper bound for each case.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub logs_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub bigquery_interval: Duration,
    /// `bigquery://project.dataset.table`; empty skips the BigQuery case.
    #[serde(default)]
    pub bigquery_spec: String,
    pub bigquery_endpoint: String,
    /// Service account JSON used for BigQuery.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            namespace: TECTONIC_SYSTEM_NAMESPACE.to_string(),
            config_map: TECTONIC_CONFIG_MAP.to_string(),
            pod_prefix: STATS_EMITTER_POD_PREFIX.to_string(),
            success_marker: SUCCESS_MARKER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            logs_interval: LOGS_POLL_INTERVAL,
            bigquery_interval: BIGQUERY_POLL_INTERVAL,
            bigquery_spec: String::new(),
            bigquery_endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials_path: None,
            kubeconfig: None,
        }
    }
}

/// Values given on the command line; `None` keeps the loaded value.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bigquery_spec: Option<String>,
    pub timeout: Option<Duration>,
    pub logs_interval: Option<Duration>,
    pub bigquery_interval: Option<Duration>,
    pub kubeconfig: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
}

/// Load verifier configuration from defaults, an optional YAML file and the
/// environment, then apply `overrides`.
///
/// With no explicit `path`, `stats-verifier.yaml` in the working directory is
/// used when present. Environment variables prefixed with `STATS_VERIFIER__`
/// override file values.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<VerifierConfig, ConfigError> {
    use config::{Config, Environment, File};
    let defaults = VerifierConfig::default();
    let builder = Config::builder()
        .set_default("namespace", defaults.namespace)?
        .set_default("config_map", defaults.config_map)?
        .set_default("pod_prefix", defaults.pod_prefix)?
        .set_default("success_marker", defaults.success_marker)?
        .set_default("timeout", "1m")?
        .set_default("logs_interval", "5s")?
        .set_default("bigquery_interval", "10s")?
        .set_default("bigquery_spec", "")?
        .set_default("bigquery_endpoint", defaults.bigquery_endpoint)?;
    let builder = match path {
        Some(path) => builder.add_source(File::from(path)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
    };
    let cfg = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let mut verifier: VerifierConfig = cfg.try_deserialize()?;
    verifier.apply(overrides);
    verifier.validate()?;
    Ok(verifier)
}

impl VerifierConfig {
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(spec) = overrides.bigquery_spec {
            self.bigquery_spec = spec;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(interval) = overrides.logs_interval {
            self.logs_interval = interval;
        }
        if let Some(interval) = overrides.bigquery_interval {
            self.bigquery_interval = interval;
        }
        if overrides.kubeconfig.is_some() {
            self.kubeconfig = overrides.kubeconfig;
        }
        if overrides.credentials_path.is_some() {
            self.credentials_path = overrides.credentials_path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Validation("timeout must be positive".into()));
        }
        if self.logs_interval.is_zero() {
            return Err(ConfigError::Validation(
                "logs_interval must be positive".into(),
            ));
        }
        if self.bigquery_interval.is_zero() {
            return Err(ConfigError::Validation(
                "bigquery_interval must be positive".into(),
            ));
        }
        for (field, value) in [
            ("namespace", &self.namespace),
            ("config_map", &self.config_map),
            ("pod_prefix", &self.pod_prefix),
            ("bigquery_endpoint", &self.bigquery_endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn logs_strategy(&self) -> PollStrategy {
        PollStrategy::new(self.logs_interval, self.timeout)
    }

    pub fn bigquery_strategy(&self) -> PollStrategy {
        PollStrategy::new(self.bigquery_interval, self.timeout)
    }
}
