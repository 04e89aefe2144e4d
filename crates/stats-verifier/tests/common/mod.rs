#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use tectonic_stats_verifier::bigquery::{AnalyticsApi, Column, QueryRow};
use tectonic_stats_verifier::clients::ClientFactory;
use tectonic_stats_verifier::cluster::{ClusterApi, ConfigData, PodSummary};
use tectonic_stats_verifier::error::{AnalyticsError, ClusterError};

pub fn pod(name: &str, containers: &[&str]) -> PodSummary {
    PodSummary {
        name: name.to_string(),
        containers: containers.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn extension_row(name: &str, value: &str) -> QueryRow {
    QueryRow::new(vec![
        Column::string("extensions_name", name),
        Column::string("extensions_value", value),
    ])
}

pub fn config_data(pairs: &[(&str, &str)]) -> ConfigData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

type LogKey = (String, String);

/// In-memory cluster; clones share state.
#[derive(Clone)]
pub struct FakeCluster {
    pods: Arc<Mutex<Result<Vec<PodSummary>, ClusterError>>>,
    logs: Arc<Mutex<BTreeMap<LogKey, Result<Vec<u8>, ClusterError>>>>,
    config_map: Arc<Mutex<Result<ConfigData, ClusterError>>>,
    log_requests: Arc<Mutex<Vec<String>>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            pods: Arc::new(Mutex::new(Ok(Vec::new()))),
            logs: Arc::new(Mutex::new(BTreeMap::new())),
            config_map: Arc::new(Mutex::new(Ok(ConfigData::new()))),
            log_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_pods(self, pods: Vec<PodSummary>) -> Self {
        self.set_pods(Ok(pods));
        self
    }

    pub fn with_logs(self, pod: &str, container: &str, logs: &str) -> Self {
        self.set_logs(pod, container, Ok(logs.as_bytes().to_vec()));
        self
    }

    pub fn with_config(self, data: ConfigData) -> Self {
        self.set_config(Ok(data));
        self
    }

    pub fn set_pods(&self, pods: Result<Vec<PodSummary>, ClusterError>) {
        *self.pods.lock().unwrap() = pods;
    }

    pub fn set_logs(&self, pod: &str, container: &str, logs: Result<Vec<u8>, ClusterError>) {
        self.logs
            .lock()
            .unwrap()
            .insert((pod.to_string(), container.to_string()), logs);
    }

    pub fn set_config(&self, data: Result<ConfigData, ClusterError>) {
        *self.config_map.lock().unwrap() = data;
    }

    /// `pod/container` for every log request, in order.
    pub fn log_requests(&self) -> Vec<String> {
        self.log_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_pods(&self, _namespace: &str) -> Result<Vec<PodSummary>, ClusterError> {
        self.pods.lock().unwrap().clone()
    }

    async fn pod_logs(
        &self,
        _namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<Vec<u8>, ClusterError> {
        self.log_requests
            .lock()
            .unwrap()
            .push(format!("{pod}/{container}"));
        self.logs
            .lock()
            .unwrap()
            .get(&(pod.to_string(), container.to_string()))
            .cloned()
            .unwrap_or(Err(ClusterError::LogStatus(404)))
    }

    async fn config_map_data(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<ConfigData, ClusterError> {
        self.config_map.lock().unwrap().clone()
    }
}

/// Analytics backend answering queued responses, repeating the last one.
#[derive(Clone)]
pub struct FakeAnalytics {
    responses: Arc<Mutex<VecDeque<Result<Vec<QueryRow>, AnalyticsError>>>>,
    queries: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeAnalytics {
    pub fn new(rows: Vec<QueryRow>) -> Self {
        Self::with_responses(vec![Ok(rows)])
    }

    pub fn with_responses(responses: Vec<Result<Vec<QueryRow>, AnalyticsError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(project, sql)` for every query issued.
    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticsApi for FakeAnalytics {
    async fn query(&self, project: &str, sql: &str) -> Result<Vec<QueryRow>, AnalyticsError> {
        self.queries
            .lock()
            .unwrap()
            .push((project.to_string(), sql.to_string()));
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or(Ok(Vec::new()))
        }
    }
}

/// Hands out clones of the same fakes for every attempt.
#[derive(Clone)]
pub struct FakeClients {
    pub cluster: FakeCluster,
    pub analytics: FakeAnalytics,
    pub cluster_connects: Arc<Mutex<u32>>,
}

impl FakeClients {
    pub fn new(cluster: FakeCluster, analytics: FakeAnalytics) -> Self {
        Self {
            cluster,
            analytics,
            cluster_connects: Arc::new(Mutex::new(0)),
        }
    }

    pub fn cluster_connects(&self) -> u32 {
        *self.cluster_connects.lock().unwrap()
    }
}

#[async_trait]
impl ClientFactory for FakeClients {
    async fn cluster(&self) -> Result<Box<dyn ClusterApi>, ClusterError> {
        *self.cluster_connects.lock().unwrap() += 1;
        Ok(Box::new(self.cluster.clone()))
    }

    async fn analytics(&self) -> Result<Box<dyn AnalyticsApi>, AnalyticsError> {
        Ok(Box::new(self.analytics.clone()))
    }
}
