//! Route definitions and router construction.

use std::path::Path;
use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::bootstrap::{AppContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // OpenAI-compatible endpoint
        .route("/v1/chat/completions", post(handlers::chat::completions))
        // Health + provider connectivity
        .route("/health", get(handlers::health::check))
        // Configuration API
        .route("/config/state", get(handlers::config::state))
        .route("/config/save", post(handlers::config::save))
        .route("/config/savePreset", post(handlers::config::save_preset))
        .route(
            "/config/presets/{id}",
            delete(handlers::config::delete_preset),
        )
        // Catalog API
        .route("/providers", get(handlers::providers::list))
        .route("/models", get(handlers::models::list))
        // Emulator control
        .route("/emulator/start", post(handlers::emulator::start))
        .route("/emulator/stop", post(handlers::emulator::stop))
}

/// Create the main router with all API routes.
pub fn create_router(ctx: AppContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    api_routes()
        .with_state(state)
        .layer(build_cors_layer(cors_config))
}

/// Create a router that also serves the config UI assets.
///
/// API routes take priority; anything else falls through to the static
/// directory, and `/` redirects to the config page.
pub fn create_spa_router<P: AsRef<Path>>(
    ctx: AppContext,
    static_dir: P,
    cors_config: &CorsConfig,
) -> Router {
    let serve_dir = ServeDir::new(static_dir.as_ref());
    create_router(ctx, cors_config)
        .route("/", get(|| async { Redirect::temporary("/config.html") }))
        .fallback_service(serve_dir)
}
