//! Health check with a live connectivity probe.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use modelmux_core::catalog::display_name;

use crate::state::AppState;

/// GET `/health`: probe the currently configured provider.
pub async fn check(State(state): State<AppState>) -> Json<Value> {
    let provider = state.state.get_config().await.provider;
    let online = state.registry.check_connectivity(&provider, None).await;
    let name = display_name(&provider);
    let message = if online {
        format!("{name} is reachable")
    } else {
        format!("{name} appears offline")
    };
    Json(json!({
        "online": online,
        "provider": provider,
        "message": message,
    }))
}
