//! Provider listing.

use axum::Json;
use serde_json::{json, Value};

use modelmux_core::registry::list_providers;

/// GET `/providers`.
pub async fn list() -> Json<Value> {
    Json(json!({ "providers": list_providers() }))
}
