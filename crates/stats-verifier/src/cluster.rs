//! Access to the Kubernetes API: pods, pod logs and config maps.

use crate::error::ClusterError;
use async_trait::async_trait;
use futures::AsyncReadExt;
use k8s_openapi::api::core::v1::{ConfigMap, Pod};
use kube::{
    Api, Client,
    api::{ListParams, LogParams},
    config::{KubeConfigOptions, Kubeconfig},
};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Key/value data of a config map.
pub type ConfigData = BTreeMap<String, String>;

/// Namespace the Tectonic components run in.
pub const TECTONIC_SYSTEM_NAMESPACE: &str = "tectonic-system";

/// Config map holding the Tectonic cluster configuration.
pub const TECTONIC_CONFIG_MAP: &str = "tectonic-config";

/// The parts of a pod the verifiers care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSummary {
    pub name: String,
    /// Container names, in spec order.
    pub containers: Vec<String>,
}

impl From<Pod> for PodSummary {
    fn from(pod: Pod) -> Self {
        Self {
            name: pod.metadata.name.unwrap_or_default(),
            containers: pod
                .spec
                .map(|spec| spec.containers.into_iter().map(|c| c.name).collect())
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Lists every pod in `namespace`, in API order.
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ClusterError>;

    /// Fetches the logs of one container.
    ///
    /// A non-2xx response is reported as [`ClusterError::LogStatus`].
    async fn pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<Vec<u8>, ClusterError>;

    /// Fetches the data of a config map; a config map without data is empty.
    async fn config_map_data(&self, namespace: &str, name: &str)
    -> Result<ConfigData, ClusterError>;
}

/// [`ClusterApi`] backed by a `kube` client.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from `kubeconfig`, or from the inferred environment
    /// (in-cluster service account or the default kubeconfig) when unset.
    #[tracing::instrument]
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self, ClusterError> {
        let mut config = match kubeconfig.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| ClusterError::Client(format!("failed to read kubeconfig: {e}")))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| ClusterError::Client(e.to_string()))?
            }
            None => kube::Config::infer()
                .await
                .map_err(|e| ClusterError::Client(e.to_string()))?,
        };
        config.connect_timeout = Some(Duration::from_secs(5));
        config.read_timeout = Some(Duration::from_secs(30));

        let client = Client::try_from(config).map_err(|e| ClusterError::Client(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    #[tracing::instrument(skip(self))]
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::ListPods(e.to_string()))?;
        Ok(list.items.into_iter().map(PodSummary::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<Vec<u8>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_string()),
            ..LogParams::default()
        };
        // Raw bytes; logs are not guaranteed to be UTF-8.
        let stream = match pods.log_stream(pod, &params).await {
            Ok(stream) => stream,
            Err(kube::Error::Api(response)) => return Err(ClusterError::LogStatus(response.code)),
            Err(e) => return Err(ClusterError::Logs(e.to_string())),
        };
        let mut logs = Vec::new();
        Box::pin(stream)
            .read_to_end(&mut logs)
            .await
            .map_err(|e| ClusterError::Logs(e.to_string()))?;
        Ok(logs)
    }

    #[tracing::instrument(skip(self))]
    async fn config_map_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ConfigData, ClusterError> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = config_maps
            .get(name)
            .await
            .map_err(|e| ClusterError::ConfigMap {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(config_map.data.unwrap_or_default())
    }
}

/// Reads the cluster configuration from one named config map.
///
/// No retry happens here; callers poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfigReader {
    pub namespace: String,
    pub name: String,
}

impl Default for ClusterConfigReader {
    fn default() -> Self {
        Self::new(TECTONIC_SYSTEM_NAMESPACE, TECTONIC_CONFIG_MAP)
    }
}

impl ClusterConfigReader {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    #[tracing::instrument(skip(self, cluster), fields(namespace = %self.namespace, name = %self.name))]
    pub async fn read<C: ClusterApi + ?Sized>(
        &self,
        cluster: &C,
    ) -> Result<ConfigData, ClusterError> {
        cluster.config_map_data(&self.namespace, &self.name).await
    }
}
