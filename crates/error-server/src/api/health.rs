//! Health check endpoint.

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

/// Health check endpoint.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Default backend health check",
    description = "Returns a plain `ok` while the default backend is accepting requests.\n\n\
                   Intended for Kubernetes liveness/readiness probes on the ingress default backend.",
    responses(
        (status = 200, description = "Backend is healthy", body = str, content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}
