//! Configuration state, saving and presets.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use modelmux_core::config::ConfigUpdate;
use modelmux_core::preset::PresetUpdate;
use modelmux_core::registry::list_providers;

use crate::handlers::models::models_payload;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    #[serde(default)]
    pub force: bool,
}

/// GET `/config/state`: everything the config UI renders in one payload.
pub async fn state(
    State(state): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Json<Value> {
    let config = state.state.get_config().await;
    let models = models_payload(&state, None, query.force).await;
    let health = state.activity.snapshot();
    let provider_online = state.registry.is_online(&config.provider);
    let last_config = config.last_config.clone();

    Json(json!({
        "endpoint": state.endpoint().await,
        "config": config,
        "presets": state.state.presets().await,
        "models": models.models,
        "modelsLastUpdated": models.last_updated,
        "providers": list_providers(),
        "emulatorActive": state.state.is_emulator_active(),
        "providerOnline": provider_online,
        "lastConfig": last_config,
        "health": health,
    }))
}

fn port_from(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// POST `/config/save`: partial update of the stored configuration.
pub async fn save(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut update = ConfigUpdate::default();
    if let Some(provider) = body.get("provider").and_then(Value::as_str) {
        update.provider = Some(provider.to_string());
    }
    if let Some(model) = body.get("model").and_then(Value::as_str) {
        update.model = Some(model.to_string());
    }
    if let Some(env_var) = body.get("apiKeyEnvVar").and_then(Value::as_str) {
        update.api_key_env_var = Some(env_var.to_string());
    }
    if let Some(raw) = body.get("port") {
        let Some(port) = port_from(raw) else {
            return failure(StatusCode::BAD_REQUEST, "Invalid port value");
        };
        update.port = Some(port);
    }

    match state.state.update_config(&update).await {
        Ok(config) => (
            StatusCode::OK,
            Json(json!({ "success": true, "config": config })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "Failed to save configuration" })),
        ),
    }
}

fn failure(status: StatusCode, error: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "error": error })))
}

/// POST `/config/savePreset`: create a preset, or update one when the body
/// carries an id.
pub async fn save_preset(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());
    let provider = body.get("provider").and_then(Value::as_str).unwrap_or_default();
    let model = body.get("model").and_then(Value::as_str).unwrap_or_default();
    let api_key_env_var = body
        .get("apiKeyEnvVar")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if name.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Name is required");
    }
    if provider.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Provider is required");
    }
    if model.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Model is required");
    }

    if let Some(id) = id {
        let update = PresetUpdate {
            name: Some(name),
            provider: Some(provider.to_string()),
            model: Some(model.to_string()),
            api_key_env_var: Some(api_key_env_var.to_string()),
        };
        match state.state.update_preset(id, &update).await {
            Ok(Some(preset)) => (
                StatusCode::OK,
                Json(json!({ "success": true, "preset": preset })),
            ),
            Ok(None) => failure(StatusCode::NOT_FOUND, "Preset not found"),
            Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update preset"),
        }
    } else {
        match state
            .state
            .add_preset(name, provider, model, api_key_env_var)
            .await
        {
            Ok(preset) => (
                StatusCode::OK,
                Json(json!({ "success": true, "preset": preset })),
            ),
            Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save preset"),
        }
    }
}

/// DELETE `/config/presets/{id}`.
pub async fn delete_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.state.delete_preset(&id).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "success": true }))),
        Ok(false) => failure(StatusCode::NOT_FOUND, "Preset not found"),
        Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete preset"),
    }
}
