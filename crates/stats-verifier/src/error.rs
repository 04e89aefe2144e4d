use std::time::Duration;
use thiserror::Error;

fn fmt_duration(duration: &Duration) -> String {
    humantime::format_duration(*duration).to_string()
}

fn fmt_last_error(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(", last error: {e}"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("BigQuery spec must begin with {scheme:?}")]
    MissingPrefix { scheme: String },
    #[error("invalid BigQuery spec: {spec:?}")]
    Malformed { spec: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("failed to get Kubernetes client: {0}")]
    Client(String),
    #[error("could not list pods: {0}")]
    ListPods(String),
    #[error("failed to get pod logs: {0}")]
    Logs(String),
    #[error("expected 200 from log response, got {0}")]
    LogStatus(u16),
    #[error("failed to find ConfigMap {name:?}: {reason}")]
    ConfigMap { name: String, reason: String },
}

/// Failures while collecting logs from the matching pods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatherError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error("failed to find pods with prefix {prefix:?} in namespace {namespace:?}")]
    NoPods { prefix: String, namespace: String },
    #[error("{pod} pod has no containers")]
    NoContainers { pod: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogsError {
    #[error("failed to gather logs for {namespace}/{prefix}, {source}")]
    Gather {
        namespace: String,
        prefix: String,
        source: GatherError,
    },
    #[error("expected logs to contain {marker:?}")]
    MarkerMissing { marker: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("failed to create BigQuery client: {0}")]
    Client(String),
    #[error("failed to load BigQuery credentials: {0}")]
    Credentials(String),
    #[error("failed to get BigQuery access token: {0}")]
    Auth(String),
    #[error("failed to read query results: {0}")]
    Query(String),
    #[error("BigQuery returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to get next row: {0}")]
    Row(String),
    #[error("query did not complete within {}", fmt_duration(.0))]
    Incomplete(Duration),
}

/// A single tracked extension that did not match the BigQuery results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionMismatch {
    #[error("did not find extension {name:?}")]
    Missing { name: String },
    #[error("expected extension {name:?} to be {expected:?}, got {found:?}")]
    WrongValue {
        name: String,
        expected: String,
        found: String,
    },
}

impl ExtensionMismatch {
    pub fn name(&self) -> &str {
        match self {
            ExtensionMismatch::Missing { name } | ExtensionMismatch::WrongValue { name, .. } => {
                name
            }
        }
    }
}

fn join_mismatches(mismatches: &[ExtensionMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything that can fail a single verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("failed to parse BigQuery spec: {0}")]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error("failed to get Tectonic cluster configuration: {0}")]
    ClusterConfig(ClusterError),
    #[error("failed to find cluster ID in ConfigMap")]
    MissingClusterId,
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    #[error("expected extension {column} to be a string")]
    NonStringColumn { column: &'static str },
    #[error("failed to find extensions in BigQuery results: {}", join_mismatches(.0))]
    Mismatches(Vec<ExtensionMismatch>),
    #[error(transparent)]
    Logs(#[from] LogsError),
}


#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error(
        "timed out after {} ({attempts} attempts){}",
        fmt_duration(.timeout),
        fmt_last_error(.last_error)
    )]
    Timeout {
        timeout: Duration,
        attempts: u32,
        last_error: Option<String>,
    },
}
