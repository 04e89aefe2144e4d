//! Minimal BigQuery REST client: `jobs.query` plus `jobs.getQueryResults` paging.

use super::{AnalyticsApi, Column, QueryRow, auth};
use crate::error::AnalyticsError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::path::Path;
use tokio::time::{Duration, Instant};

/// Public BigQuery API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com";

/// How long the server may hold a `query`/`getQueryResults` call open.
const SERVER_WAIT: Duration = Duration::from_secs(10);

/// How long to keep waiting for an unfinished job before giving up.
const MAX_JOB_WAIT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    page_token: Option<String>,
    job_reference: Option<JobReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
struct TableFieldSchema {
    name: String,
    #[serde(rename = "type", default)]
    field_type: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
    location: Option<String>,
}

/// [`AnalyticsApi`] over the BigQuery v2 REST API.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    http: reqwest::Client,
    endpoint: String,
    authorization: Option<String>,
    max_job_wait: Duration,
}

impl BigQueryClient {
    /// Client for `endpoint` sending `authorization` (if any) with every request.
    pub fn new(
        endpoint: impl Into<String>,
        authorization: Option<String>,
    ) -> Result<Self, AnalyticsError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(SERVER_WAIT + Duration::from_secs(20))
            .build()
            .map_err(|e| AnalyticsError::Client(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            authorization,
            max_job_wait: MAX_JOB_WAIT,
        })
    }

    /// Client authenticated with a service account file, or the metadata
    /// server when `credentials_path` is unset.
    pub async fn connect(
        endpoint: impl Into<String>,
        credentials_path: Option<&Path>,
    ) -> Result<Self, AnalyticsError> {
        let authorization = auth::fetch_authorization(credentials_path).await?;
        Self::new(endpoint, Some(authorization))
    }

    pub fn with_max_job_wait(mut self, max_job_wait: Duration) -> Self {
        self.max_job_wait = max_job_wait;
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AnalyticsError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AnalyticsError::Query(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Http {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AnalyticsError::Query(format!("invalid response body: {e}")))
    }

    async fn start_query(&self, project: &str, sql: &str) -> Result<QueryResponse, AnalyticsError> {
        let url = format!("{}/bigquery/v2/projects/{}/queries", self.endpoint, project);
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: true,
            timeout_ms: SERVER_WAIT.as_millis() as u64,
        };
        self.send(self.http.post(url).json(&body)).await
    }

    async fn query_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, AnalyticsError> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/queries/{}",
            self.endpoint, job.project_id, job.job_id
        );
        let mut params = vec![("timeoutMs", SERVER_WAIT.as_millis().to_string())];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.send(self.http.get(url).query(&params)).await
    }
}

fn decode_rows(schema: &TableSchema, rows: Vec<TableRow>) -> Result<Vec<QueryRow>, AnalyticsError> {
    rows.into_iter()
        .map(|row| {
            if row.f.len() != schema.fields.len() {
                return Err(AnalyticsError::Row(format!(
                    "row has {} cells but the schema has {} fields",
                    row.f.len(),
                    schema.fields.len()
                )));
            }
            let columns = schema
                .fields
                .iter()
                .zip(row.f)
                .map(|(field, cell)| Column {
                    name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    value: cell.v,
                })
                .collect();
            Ok(QueryRow::new(columns))
        })
        .collect()
}

#[async_trait]
impl AnalyticsApi for BigQueryClient {
    #[tracing::instrument(skip(self, sql))]
    async fn query(&self, project: &str, sql: &str) -> Result<Vec<QueryRow>, AnalyticsError> {
        let started = Instant::now();
        let mut response = self.start_query(project, sql).await?;
        let mut schema: Option<TableSchema> = None;
        let mut rows = Vec::new();

        loop {
            if response.schema.is_some() {
                schema = response.schema.take();
            }
            let page_token = if response.job_complete {
                let schema = schema
                    .as_ref()
                    .ok_or_else(|| AnalyticsError::Row("response lacks a schema".into()))?;
                rows.extend(decode_rows(schema, std::mem::take(&mut response.rows))?);
                match response.page_token.take() {
                    Some(token) => Some(token),
                    None => break,
                }
            } else {
                if started.elapsed() >= self.max_job_wait {
                    return Err(AnalyticsError::Incomplete(self.max_job_wait));
                }
                None
            };

            let job = response
                .job_reference
                .clone()
                .ok_or_else(|| AnalyticsError::Query("response lacks a job reference".into()))?;
            tracing::debug!(
                name = "bigquery.query.page",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                job_id = %job.job_id,
                rows_so_far = rows.len(),
                message = "fetching query results"
            );
            response = self.query_results(&job, page_token.as_deref()).await?;
            if response.job_reference.is_none() {
                response.job_reference = Some(job);
            }
        }

        Ok(rows)
    }
}
