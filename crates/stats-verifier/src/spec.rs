//! Parsing of `bigquery://project.dataset.table` specs.

use crate::error::SpecError;
use regex::Regex;
use std::fmt;

/// Scheme every BigQuery spec must start with.
pub const BIGQUERY_SCHEME: &str = "bigquery://";

/// A BigQuery table, identified by project, dataset and table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigQuerySpec {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl BigQuerySpec {
    /// Table reference in legacy SQL form, `project:dataset.table`.
    pub fn legacy_table_ref(&self) -> String {
        format!("{}:{}.{}", self.project, self.dataset, self.table)
    }
}

impl fmt::Display for BigQuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{BIGQUERY_SCHEME}{}.{}.{}",
            self.project, self.dataset, self.table
        )
    }
}

/// Parser holding the scheme and the compiled spec pattern.
///
/// Build one per run and pass it to whatever needs to parse specs.
#[derive(Debug, Clone)]
pub struct BigQuerySpecParser {
    scheme: String,
    pattern: Regex,
}

impl Default for BigQuerySpecParser {
    fn default() -> Self {
        Self::with_scheme(BIGQUERY_SCHEME).expect("escaped scheme always yields a valid pattern")
    }
}

impl BigQuerySpecParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser for specs that start with `scheme` instead of `bigquery://`.
    pub fn with_scheme(scheme: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^{}([^.]+)\.([^.]+)\.([^.]+)$",
            regex::escape(scheme)
        ))?;
        Ok(Self {
            scheme: scheme.to_string(),
            pattern,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Parses a spec formatted as `bigquery://project.dataset.table`.
    ///
    /// Fails with [`SpecError::MissingPrefix`] if the spec does not start with
    /// the scheme, or [`SpecError::Malformed`] if it does but the remainder is
    /// not exactly three non-empty, dot-free segments.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn parse(&self, spec: &str) -> Result<BigQuerySpec, SpecError> {
        if !spec.starts_with(&self.scheme) {
            return Err(SpecError::MissingPrefix {
                scheme: self.scheme.clone(),
            });
        }
        let captures = self
            .pattern
            .captures(spec)
            .ok_or_else(|| SpecError::Malformed {
                spec: spec.to_string(),
            })?;
        Ok(BigQuerySpec {
            project: captures[1].to_string(),
            dataset: captures[2].to_string(),
            table: captures[3].to_string(),
        })
    }
}
