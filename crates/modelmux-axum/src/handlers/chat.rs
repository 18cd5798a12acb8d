//! The OpenAI-compatible chat completions endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// POST `/v1/chat/completions`.
///
/// The body is parsed here rather than with a typed extractor so that a
/// malformed payload produces the emulator's own error body instead of the
/// framework's rejection.
pub async fn completions(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(error) => {
            let toggles = state.state.get_config().await.logging;
            state.activity.record_error(
                &toggles,
                &error.to_string(),
                json!({ "endpoint": "/v1/chat/completions" }),
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": {
                        "message": "Internal server error",
                        "type": "internal_server_error",
                    }
                })),
            );
        }
    };

    let response = state.adapter.handle_chat_completion(&parsed).await;
    (
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response.body),
    )
}
