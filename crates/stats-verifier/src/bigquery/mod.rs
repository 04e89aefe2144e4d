//! BigQuery access and verification of the reported stats extensions.

pub mod auth;
pub mod client;
pub mod verify;

pub use client::BigQueryClient;
pub use verify::{BigQueryVerifier, ExtensionExpectation, QueryResult};

use crate::error::AnalyticsError;
use async_trait::async_trait;
use serde_json::Value;

/// One cell of a result row, tagged with its schema column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// BigQuery type name from the result schema, e.g. `STRING`.
    pub field_type: String,
    pub value: Value,
}

impl Column {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: "STRING".to_string(),
            value: Value::String(value.into()),
        }
    }

    /// The value, if the column is a non-null `STRING`.
    pub fn as_str(&self) -> Option<&str> {
        if self.field_type != "STRING" {
            return None;
        }
        self.value.as_str()
    }
}

/// One result row, columns in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRow {
    pub columns: Vec<Column>,
}

impl QueryRow {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// Runs one legacy SQL query billed to `project` and returns every row.
    async fn query(&self, project: &str, sql: &str) -> Result<Vec<QueryRow>, AnalyticsError>;
}
