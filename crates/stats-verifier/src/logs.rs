//! Verifies that the stats emitter logged a successful report.

use crate::cluster::{ClusterApi, TECTONIC_SYSTEM_NAMESPACE};
use crate::error::{GatherError, LogsError};

/// Name prefix of the stats emitter pods.
pub const STATS_EMITTER_POD_PREFIX: &str = "tectonic-stats-emitter";

/// Log line the emitter writes after a report was delivered.
pub const SUCCESS_MARKER: &str = "report successfully sent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogVerifier {
    pub namespace: String,
    pub pod_prefix: String,
    pub marker: String,
}

impl Default for LogVerifier {
    fn default() -> Self {
        Self::new(
            TECTONIC_SYSTEM_NAMESPACE,
            STATS_EMITTER_POD_PREFIX,
            SUCCESS_MARKER,
        )
    }
}

impl LogVerifier {
    pub fn new(
        namespace: impl Into<String>,
        pod_prefix: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod_prefix: pod_prefix.into(),
            marker: marker.into(),
        }
    }

    /// Concatenates the first-container logs of every pod matching the prefix.
    ///
    /// Fails on the first pod without containers or whose logs cannot be
    /// fetched; fails if no pod matches at all.
    #[tracing::instrument(skip(self, cluster), fields(namespace = %self.namespace, prefix = %self.pod_prefix))]
    pub async fn gather_logs<C: ClusterApi + ?Sized>(
        &self,
        cluster: &C,
    ) -> Result<Vec<u8>, GatherError> {
        let pods = cluster.list_pods(&self.namespace).await?;

        let mut all_logs = Vec::new();
        let mut found = false;
        for pod in pods
            .iter()
            .filter(|p| p.name.starts_with(&self.pod_prefix))
        {
            found = true;
            let container = pod
                .containers
                .first()
                .ok_or_else(|| GatherError::NoContainers {
                    pod: pod.name.clone(),
                })?;

            let logs = cluster
                .pod_logs(&self.namespace, &pod.name, container)
                .await?;
            tracing::debug!(
                name = "logs.pod.fetched",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                pod = %pod.name,
                container = %container,
                bytes = logs.len(),
                message = "fetched pod logs"
            );
            all_logs.extend_from_slice(&logs);
        }

        if !found {
            return Err(GatherError::NoPods {
                prefix: self.pod_prefix.clone(),
                namespace: self.namespace.clone(),
            });
        }
        Ok(all_logs)
    }

    /// Checks that the gathered logs contain the success marker.
    #[tracing::instrument(skip(self, cluster))]
    pub async fn verify<C: ClusterApi + ?Sized>(&self, cluster: &C) -> Result<(), LogsError> {
        let logs = self
            .gather_logs(cluster)
            .await
            .map_err(|source| LogsError::Gather {
                namespace: self.namespace.clone(),
                prefix: self.pod_prefix.clone(),
                source,
            })?;

        if !contains_bytes(&logs, self.marker.as_bytes()) {
            return Err(LogsError::MarkerMissing {
                marker: self.marker.clone(),
            });
        }
        Ok(())
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
