//! Axum HTTP adapter for the modelmux emulator.
//!
//! Exposes the OpenAI-compatible completion endpoint plus the
//! configuration, catalog and emulator-control API consumed by the
//! config UI.

#![deny(unused_crate_dependencies)]

// Dev-dependencies used by the integration tests in `tests/`, not by the
// lib's own unit-test build.
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::{bootstrap, start_server, AppContext, CorsConfig, ServerConfig};
pub use routes::{create_router, create_spa_router};
pub use state::AppState;
