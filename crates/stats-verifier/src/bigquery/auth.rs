//! OAuth tokens for the BigQuery REST API.
//!
//! A service account credentials file is exchanged for a token with a signed
//! JWT. Without a file, the GCE metadata server is asked for the token of the
//! instance's default service account.

use crate::error::AnalyticsError;
use goauth::{
    auth::{JwtClaims, Token},
    credentials::Credentials,
    scopes::Scope,
};
use smpl_jwt::Jwt;
use std::path::Path;

/// Environment variable naming the service account credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const SERVICE_ACCOUNT_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Returns an `Authorization` header value, e.g. `Bearer ya29...`.
#[tracing::instrument]
pub async fn fetch_authorization(
    credentials_path: Option<&Path>,
) -> Result<String, AnalyticsError> {
    let token = match credentials_path {
        Some(path) => token_from_file(path).await?,
        None => token_from_metadata().await?,
    };
    Ok(format!("{} {}", token.token_type(), token.access_token()))
}

async fn token_from_file(path: &Path) -> Result<Token, AnalyticsError> {
    let path = path
        .to_str()
        .ok_or_else(|| AnalyticsError::Credentials(format!("non UTF-8 path {path:?}")))?;
    let creds =
        Credentials::from_file(path).map_err(|e| AnalyticsError::Credentials(e.to_string()))?;
    let claims = JwtClaims::new(
        creds.iss(),
        &[Scope::CloudPlatform],
        creds.token_uri(),
        None,
        None,
    );
    let rsa_key = creds
        .rsa_key()
        .map_err(|e| AnalyticsError::Credentials(e.to_string()))?;
    let jwt = Jwt::new(claims, rsa_key, None);

    tracing::debug!(
        name = "bigquery.auth.fetch",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        project = ?creds.project(),
        iss = ?creds.iss(),
        message = "Fetching GCP authentication token"
    );
    goauth::get_token(&jwt, &creds)
        .await
        .map_err(|e| AnalyticsError::Auth(e.to_string()))
}

async fn token_from_metadata() -> Result<Token, AnalyticsError> {
    tracing::debug!(
        name = "bigquery.auth.implicit",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        message = "Fetching implicit GCP authentication token"
    );
    let response = reqwest::Client::new()
        .get(SERVICE_ACCOUNT_TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| AnalyticsError::Auth(e.to_string()))?;
    if !response.status().is_success() {
        return Err(AnalyticsError::Auth(format!(
            "metadata server returned HTTP {}",
            response.status().as_u16()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalyticsError::Auth(e.to_string()))?;
    serde_json::from_slice::<Token>(&bytes).map_err(|e| AnalyticsError::Auth(e.to_string()))
}
