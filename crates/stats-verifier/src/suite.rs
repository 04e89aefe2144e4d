//! Runs the verification cases in order and aggregates their outcomes.

use crate::bigquery::BigQueryVerifier;
use crate::clients::ClientFactory;
use crate::cluster::ClusterConfigReader;
use crate::config::VerifierConfig;
use crate::error::VerifyError;
use crate::logs::LogVerifier;
use crate::spec::BigQuerySpecParser;
use std::fmt;
use tokio::time::{Duration, Instant};

pub const STATS_EMITTER_LOGS_CASE: &str = "StatsEmitterLogs";
pub const BIGQUERY_DATA_CASE: &str = "BigQueryData";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed { attempts: u32, elapsed: Duration },
    Failed { reason: String },
    Skipped { reason: String },
}

impl CaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseOutcome::Failed { .. })
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseOutcome::Passed { attempts, elapsed } => write!(
                f,
                "PASS after {attempts} attempt(s) in {}",
                humantime::format_duration(*elapsed)
            ),
            CaseOutcome::Failed { reason } => write!(f, "FAIL: {reason}"),
            CaseOutcome::Skipped { reason } => write!(f, "SKIP: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub name: &'static str,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// True when no case failed; skipped cases count as success.
    pub fn success(&self) -> bool {
        !self.cases.iter().any(|c| c.outcome.is_failure())
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }

    pub fn case(&self, name: &str) -> Option<&CaseOutcome> {
        self.cases
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.outcome)
    }
}

/// The stats pipeline checks, sharing one configuration.
pub struct Suite<F> {
    config: VerifierConfig,
    clients: F,
    parser: BigQuerySpecParser,
}

impl<F: ClientFactory> Suite<F> {
    pub fn new(config: VerifierConfig, clients: F) -> Self {
        Self {
            config,
            clients,
            parser: BigQuerySpecParser::new(),
        }
    }

    /// Runs every case sequentially; a failing case does not stop the next.
    pub async fn run(&self) -> SuiteReport {
        let mut report = SuiteReport::default();
        for (name, outcome) in [
            (STATS_EMITTER_LOGS_CASE, self.run_logs_case().await),
            (BIGQUERY_DATA_CASE, self.run_bigquery_case().await),
        ] {
            log_outcome(name, &outcome);
            report.cases.push(CaseReport { name, outcome });
        }
        report
    }

    /// Polls until the stats emitter logged a successful report.
    #[tracing::instrument(skip(self))]
    pub async fn run_logs_case(&self) -> CaseOutcome {
        let verifier = LogVerifier::new(
            &self.config.namespace,
            &self.config.pod_prefix,
            &self.config.success_marker,
        );
        let clients = &self.clients;
        let verifier = &verifier;
        let started = Instant::now();

        let result = self
            .config
            .logs_strategy()
            .poll(move || async move {
                let cluster = clients.cluster().await.map_err(VerifyError::Cluster)?;
                verifier.verify(cluster.as_ref()).await?;
                Ok::<_, VerifyError>(true)
            })
            .await;

        match result {
            Ok(attempts) => CaseOutcome::Passed {
                attempts,
                elapsed: started.elapsed(),
            },
            Err(e) => CaseOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Polls until BigQuery shows the extensions from the cluster config.
    ///
    /// Skipped when no spec is configured; a malformed spec fails without polling.
    #[tracing::instrument(skip(self))]
    pub async fn run_bigquery_case(&self) -> CaseOutcome {
        if self.config.bigquery_spec.trim().is_empty() {
            return CaseOutcome::Skipped {
                reason: "no BigQuery spec given".to_string(),
            };
        }

        let spec = match self.parser.parse(self.config.bigquery_spec.trim()) {
            Ok(spec) => spec,
            Err(e) => {
                return CaseOutcome::Failed {
                    reason: VerifyError::from(e).to_string(),
                };
            }
        };

        let reader = ClusterConfigReader::new(&self.config.namespace, &self.config.config_map);
        let verifier = BigQueryVerifier::new(spec);
        let clients = &self.clients;
        let reader = &reader;
        let verifier = &verifier;
        let started = Instant::now();

        let result = self
            .config
            .bigquery_strategy()
            .poll(move || async move {
                let cluster = clients.cluster().await.map_err(VerifyError::Cluster)?;
                let config = reader
                    .read(cluster.as_ref())
                    .await
                    .map_err(VerifyError::ClusterConfig)?;
                let analytics = clients.analytics().await?;
                verifier.verify(&config, analytics.as_ref()).await?;
                Ok::<_, VerifyError>(true)
            })
            .await;

        match result {
            Ok(attempts) => CaseOutcome::Passed {
                attempts,
                elapsed: started.elapsed(),
            },
            Err(e) => CaseOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

fn log_outcome(name: &str, outcome: &CaseOutcome) {
    let target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!());
    match outcome {
        CaseOutcome::Passed { attempts, elapsed } => tracing::info!(
            name = "suite.case.passed",
            target = target,
            case = name,
            attempts = attempts,
            elapsed = ?elapsed,
            message = "case passed"
        ),
        CaseOutcome::Failed { reason } => tracing::error!(
            name = "suite.case.failed",
            target = target,
            case = name,
            reason = %reason,
            message = "case failed"
        ),
        CaseOutcome::Skipped { reason } => tracing::info!(
            name = "suite.case.skipped",
            target = target,
            case = name,
            reason = %reason,
            message = "case skipped"
        ),
    }
}
