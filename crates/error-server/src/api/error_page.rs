//! Catch-all error page endpoint.
//!
//! The ingress controller forwards intercepted responses here and passes the
//! original status in the `X-Code` header. Known codes get the rendered error
//! template; anything else falls back to the static index page.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::templates::{ErrorPageTemplate, index_page};

/// Tag for OpenAPI documentation.
pub const ERROR_PAGES_TAG: &str = "Error Pages";

/// Header carrying the status code the ingress controller intercepted.
pub const X_CODE_HEADER: &str = "x-code";

/// Message rendered when `X-Code` is present but not an integer.
pub const INVALID_CODE_MESSAGE: &str = "unable to get error code";

/// Which page a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// The static index page, always served as 404.
    Index,
    /// The error template, served with `status`.
    Error {
        status: StatusCode,
        message: &'static str,
    },
}

/// Returns the status and message for the codes that have a dedicated error page.
pub fn known_error(code: i64) -> Option<(StatusCode, &'static str)> {
    match code {
        400 => Some((StatusCode::BAD_REQUEST, "Bad Request")),
        401 => Some((StatusCode::UNAUTHORIZED, "Unauthorized Access")),
        403 => Some((StatusCode::FORBIDDEN, "Forbidden")),
        404 => Some((StatusCode::NOT_FOUND, "Not Found")),
        500 => Some((StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")),
        503 => Some((StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")),
        504 => Some((StatusCode::GATEWAY_TIMEOUT, "Gateway Time-out")),
        _ => None,
    }
}

/// Resolve the page to serve from the request headers.
pub fn resolve_page(headers: &HeaderMap) -> Page {
    // An empty header is the same as no header.
    let code = match headers.get(X_CODE_HEADER).map(|v| v.to_str()) {
        None | Some(Ok("")) => 0,
        Some(Ok(raw)) => match raw.parse::<i64>() {
            Ok(code) => code,
            Err(_) => return invalid_code(),
        },
        Some(Err(_)) => return invalid_code(),
    };

    match known_error(code) {
        Some((status, message)) => Page::Error { status, message },
        None => Page::Index,
    }
}

fn invalid_code() -> Page {
    Page::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: INVALID_CODE_MESSAGE,
    }
}

/// Render the error page named by the `X-Code` header.
#[tracing::instrument(skip(headers))]
#[utoipa::path(
    get,
    path = "/",
    tag = ERROR_PAGES_TAG,
    operation_id = "Error Page",
    summary = "Render an error page",
    description = "Serves every path other than `/healthz`, for any method.\n\n\
                   The `X-Code` header selects the page: 400, 401, 403, 404, 500, 503 and 504 \
                   render the error template with that status. A missing header or any other \
                   code serves the index page as 404. A non-numeric header renders a 500 page.",
    params(
        ("X-Code" = Option<String>, Header, description = "Status code intercepted by the ingress controller")
    ),
    responses(
        (status = 404, description = "Index page or Not Found page", body = str, content_type = "text/html"),
        (status = 500, description = "Internal Server Error page, or an unparseable X-Code", body = str, content_type = "text/html"),
        (status = "default", description = "Error page for the requested code", body = str, content_type = "text/html")
    )
)]
pub async fn error_page(headers: HeaderMap) -> Response {
    match resolve_page(&headers) {
        Page::Index => (StatusCode::NOT_FOUND, Html(index_page())).into_response(),
        Page::Error { status, message } => render_error(status, message),
    }
}

fn render_error(status: StatusCode, message: &str) -> Response {
    match ErrorPageTemplate::new(status.as_u16(), message).render_html() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(error) => {
            tracing::error!(
                name = "error_page.render.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?error,
                status = status.as_u16(),
                message = "Unable to execute template"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
