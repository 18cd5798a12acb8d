//! Emulator start/stop control.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use modelmux_core::catalog::display_name;
use modelmux_core::config::ProviderSelection;
use modelmux_core::registry::list_models;

use crate::state::AppState;

fn failure(status: StatusCode, error: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "error": error })))
}

/// POST `/emulator/start`.
///
/// Gate order: field validation, then a live connectivity probe, then
/// catalog membership of the model. Only after all three pass is the
/// selection persisted and the emulator activated.
pub async fn start(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(provider) = body
        .get("provider")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
    else {
        return failure(StatusCode::BAD_REQUEST, "Provider is required");
    };
    let Some(model) = body
        .get("model")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
    else {
        return failure(StatusCode::BAD_REQUEST, "Model is required");
    };
    let api_key_env_var = body
        .get("apiKeyEnvVar")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if !state.registry.check_connectivity(provider, None).await {
        let message = format!("{} is offline or API key is invalid", display_name(provider));
        return failure(StatusCode::SERVICE_UNAVAILABLE, &message);
    }

    let known = list_models(Some(provider))
        .iter()
        .any(|entry| entry.id == model);
    if !known {
        let message = format!("Model \"{model}\" not found for provider");
        return failure(StatusCode::BAD_REQUEST, &message);
    }

    let selection = ProviderSelection {
        provider: provider.to_string(),
        model: model.to_string(),
        api_key_env_var: api_key_env_var.to_string(),
    };
    match state.state.start_emulator(selection).await {
        Ok(()) => {
            tracing::info!("Emulator started: {provider}/{model}");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "config": {
                        "provider": provider,
                        "model": model,
                        "apiKeyEnvVar": api_key_env_var,
                    }
                })),
            )
        }
        Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start"),
    }
}

/// POST `/emulator/stop`.
pub async fn stop(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.state.stop_emulator().await {
        Ok(()) => {
            tracing::info!("Emulator stopped");
            (StatusCode::OK, Json(json!({ "success": true })))
        }
        Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stop"),
    }
}
