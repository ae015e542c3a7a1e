//! Bazaar shop API library.
//!
//! This crate provides the HTTP API as a library, allowing it to be tested
//! against the in-process store and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Wrap a router so trailing slashes are trimmed before routing.
///
/// Serve the result with
/// `axum::ServiceExt::<axum::extract::Request>::into_make_service`.
#[must_use]
pub fn normalize_paths(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}
