//! API module providing HTTP endpoints for the error server.
//!
//! This module is organized into submodules:
//! - `error_page` - Catch-all error page (every path except /healthz)
//! - `health` - Health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod error_page;
pub mod health;
pub mod openapi;

pub use error_page::ERROR_PAGES_TAG;
pub use health::MISC_TAG;

use crate::config::ServerConfig;
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(openapi::ApiDoc::openapi()).routes(routes!(health::health))
}

/// Builds the application router.
///
/// Every path except `/healthz` falls through to the error page handler.
/// `/healthz` answers `ok` for any method.
pub fn router() -> Router {
    let (router, _api) = api_router().split_for_parts();
    router
        .method_not_allowed_fallback(health::health)
        .fallback(error_page::error_page)
        .layer(TraceLayer::new_for_http())
}

/// The OpenAPI document for every route the server exposes.
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, api) = api_router().split_for_parts();
    api
}

/// Starts the web server on the configured address.
#[tracing::instrument(skip(config), fields(addr = %config.addr))]
pub async fn start_webserver(config: &ServerConfig) -> color_eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!(
        name = "server.listening",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        addr = %config.addr,
        message = "Default backend running"
    );
    axum::serve(listener, router())
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
