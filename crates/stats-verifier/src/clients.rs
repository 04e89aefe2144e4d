//! Construction of the cluster and analytics clients for one attempt.

use crate::bigquery::{AnalyticsApi, BigQueryClient};
use crate::cluster::{ClusterApi, KubeCluster};
use crate::error::{AnalyticsError, ClusterError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Builds fresh clients; every poll attempt asks for new ones.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn cluster(&self) -> Result<Box<dyn ClusterApi>, ClusterError>;

    async fn analytics(&self) -> Result<Box<dyn AnalyticsApi>, AnalyticsError>;
}

/// [`ClientFactory`] talking to the real Kubernetes and BigQuery APIs.
#[derive(Debug, Clone, Default)]
pub struct LiveClients {
    pub kubeconfig: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub bigquery_endpoint: String,
}

impl LiveClients {
    pub fn new(
        kubeconfig: Option<PathBuf>,
        credentials_path: Option<PathBuf>,
        bigquery_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            kubeconfig,
            credentials_path,
            bigquery_endpoint: bigquery_endpoint.into(),
        }
    }
}

#[async_trait]
impl ClientFactory for LiveClients {
    async fn cluster(&self) -> Result<Box<dyn ClusterApi>, ClusterError> {
        let cluster = KubeCluster::connect(self.kubeconfig.as_deref()).await?;
        Ok(Box::new(cluster))
    }

    async fn analytics(&self) -> Result<Box<dyn AnalyticsApi>, AnalyticsError> {
        let client = BigQueryClient::connect(
            self.bigquery_endpoint.clone(),
            self.credentials_path.as_deref(),
        )
        .await?;
        Ok(Box::new(client))
    }
}
