//! Comparison of the extensions reported to BigQuery with the cluster config.

use super::{AnalyticsApi, QueryRow};
use crate::cluster::ConfigData;
use crate::error::{ExtensionMismatch, VerifyError};
use crate::spec::BigQuerySpec;
use std::collections::BTreeMap;

/// Extensions every report must carry, in the order they are checked.
pub const TRACKED_EXTENSIONS: [&str; 4] = [
    "accountID",
    "certificatesStrategy",
    "installerPlatform",
    "tectonicUpdaterEnabled",
];

pub const EXTENSIONS_NAME_KEY: &str = "extensions_name";
pub const EXTENSIONS_VALUE_KEY: &str = "extensions_value";

/// Config map key holding the cluster ID reports are filed under.
pub const CLUSTER_ID_KEY: &str = "clusterID";

/// What BigQuery must show for one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionExpectation {
    pub name: &'static str,
    /// `None` only requires the extension to be present.
    pub expected: Option<String>,
}

/// Extension name to the last value seen for it.
pub type QueryResult = BTreeMap<String, String>;

/// One expectation per tracked extension, exact when the config has the key.
pub fn expectations(config: &ConfigData) -> Vec<ExtensionExpectation> {
    TRACKED_EXTENSIONS
        .iter()
        .map(|&name| ExtensionExpectation {
            name,
            expected: config.get(name).cloned(),
        })
        .collect()
}

fn escape_string_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Legacy SQL selecting the distinct extensions reported for `cluster_id`.
pub fn build_query(spec: &BigQuerySpec, cluster_id: &str) -> String {
    format!(
        "SELECT\n extensions.name,\n extensions.value,\nFROM\n  FLATTEN([{}], extensions)\nWHERE\n clusterID = '{}'\nGROUP BY\n extensions.name,\n extensions.value",
        spec.legacy_table_ref(),
        escape_string_literal(cluster_id)
    )
}

/// Folds the rows into a [`QueryResult`]; a later row for the same name wins.
pub fn collect_results(rows: &[QueryRow]) -> Result<QueryResult, VerifyError> {
    let mut results = QueryResult::new();
    for row in rows {
        let name = row
            .get(EXTENSIONS_NAME_KEY)
            .and_then(|c| c.as_str())
            .ok_or(VerifyError::NonStringColumn { column: "name" })?;
        let value = row
            .get(EXTENSIONS_VALUE_KEY)
            .and_then(|c| c.as_str())
            .ok_or(VerifyError::NonStringColumn { column: "value" })?;
        results.insert(name.to_string(), value.to_string());
    }
    Ok(results)
}

/// Every expectation the results violate, in expectation order.
pub fn compare(
    expectations: &[ExtensionExpectation],
    results: &QueryResult,
) -> Vec<ExtensionMismatch> {
    expectations
        .iter()
        .filter_map(|expectation| {
            let found = results.get(expectation.name);
            match (&expectation.expected, found) {
                (Some(expected), found) => {
                    let found = found.map(String::as_str).unwrap_or_default();
                    (expected != found).then(|| ExtensionMismatch::WrongValue {
                        name: expectation.name.to_string(),
                        expected: expected.clone(),
                        found: found.to_string(),
                    })
                }
                (None, None) => Some(ExtensionMismatch::Missing {
                    name: expectation.name.to_string(),
                }),
                (None, Some(_)) => None,
            }
        })
        .collect()
}

/// Checks one BigQuery table against the cluster's config map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigQueryVerifier {
    pub spec: BigQuerySpec,
}

impl BigQueryVerifier {
    pub fn new(spec: BigQuerySpec) -> Self {
        Self { spec }
    }

    /// Runs one query and compares the reported extensions with `config`.
    #[tracing::instrument(skip(self, config, analytics), fields(spec = %self.spec))]
    pub async fn verify<A: AnalyticsApi + ?Sized>(
        &self,
        config: &ConfigData,
        analytics: &A,
    ) -> Result<(), VerifyError> {
        let cluster_id = config
            .get(CLUSTER_ID_KEY)
            .ok_or(VerifyError::MissingClusterId)?;

        let sql = build_query(&self.spec, cluster_id);
        let rows = analytics.query(&self.spec.project, &sql).await?;
        let results = collect_results(&rows)?;
        tracing::debug!(
            name = "bigquery.results.collected",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            cluster_id = %cluster_id,
            rows = rows.len(),
            extensions = results.len(),
            message = "collected extensions from BigQuery"
        );

        let mismatches = compare(&expectations(config), &results);
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(VerifyError::Mismatches(mismatches))
        }
    }
}
