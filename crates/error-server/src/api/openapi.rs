//! OpenAPI/Utoipa configuration.

use crate::api::{error_page::ERROR_PAGES_TAG, health::MISC_TAG};
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
///
/// `/healthz` is collected from the router; the catch-all error page is a
/// fallback handler, so it is listed here explicitly.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tectonic Error Server",
        version = "1.0.0",
        description = "Default backend that renders error pages for an ingress controller."
    ),
    paths(crate::api::error_page::error_page),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = ERROR_PAGES_TAG, description = "Error pages selected by the X-Code header")
    )
)]
pub struct ApiDoc;
