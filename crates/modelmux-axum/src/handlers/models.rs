//! Model listing with the persisted cache in front of the catalog.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use modelmux_core::models_cache::{ModelEntry, MODELS_CACHE_TTL};
use modelmux_core::registry::list_models;

use crate::bootstrap::AppContext;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsPayload {
    pub models: Vec<ModelEntry>,
    pub last_updated: Option<i64>,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serve models from the cache when it is populated and fresh; otherwise
/// refresh from the catalog and persist the result. A failed persist falls
/// back to whatever was cached.
pub(crate) async fn models_payload(
    ctx: &AppContext,
    provider: Option<&str>,
    force: bool,
) -> ModelsPayload {
    let cache = ctx.state.models_cache().await;
    if !force
        && !cache.models.is_empty()
        && !ctx.state.is_models_cache_stale(MODELS_CACHE_TTL).await
    {
        return ModelsPayload {
            models: cache.models,
            last_updated: cache.last_updated,
            source: "cache",
            error: None,
        };
    }

    let models = list_models(provider);
    match ctx.state.save_models_cache(models.clone()).await {
        Ok(saved) => ModelsPayload {
            models,
            last_updated: saved.last_updated,
            source: "catalog",
            error: None,
        },
        Err(error) => ModelsPayload {
            models: cache.models,
            last_updated: cache.last_updated,
            source: "cache",
            error: Some(error.to_string()),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    #[serde(default)]
    pub force: bool,
    pub provider: Option<String>,
}

/// GET `/models`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ModelsQuery>,
) -> Json<ModelsPayload> {
    Json(models_payload(&state, query.provider.as_deref(), query.force).await)
}
