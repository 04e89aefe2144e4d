//! Default backend for an ingress controller.
//!
//! Renders an error page for the status code the ingress passes in the
//! `X-Code` header and serves a health-check endpoint.

pub mod api;
pub mod config;
pub mod templates;
