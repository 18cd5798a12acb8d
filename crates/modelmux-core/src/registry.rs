//! Provider registry: catalog views, secret resolution and connectivity.
//!
//! Listing and key resolution are pure functions over the static catalog
//! plus the process environment; connectivity state is last-known-good,
//! held only in memory and reset on restart.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::catalog;
use crate::models_cache::ModelEntry;
use crate::ports::{CompletionPort, CompletionRequest, ProviderMessage};

/// Hard timeout on the connectivity probe call.
pub const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

const PROBE_PROMPT: &str = "Hi";
const PROBE_MAX_TOKENS: u32 = 5;

/// A provider as presented to clients. Only `has_api_key` is derived from
/// the environment; the secret value itself is never exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderListing {
    pub id: String,
    pub name: String,
    pub env_var: String,
    pub has_api_key: bool,
    pub models: Vec<ProviderModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderModel {
    pub id: String,
    pub label: String,
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

/// List all supported providers with their models and key presence.
pub fn list_providers() -> Vec<ProviderListing> {
    catalog::SUPPORTED_PROVIDERS
        .iter()
        .map(|provider| ProviderListing {
            id: provider.id.to_string(),
            name: provider.name.to_string(),
            env_var: provider.env_var.to_string(),
            has_api_key: env_non_empty(provider.env_var).is_some(),
            models: provider
                .models
                .iter()
                .map(|model| ProviderModel {
                    id: model.id.to_string(),
                    label: model.label.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// List normalized models, optionally filtered to one provider.
///
/// An unknown provider filter yields an empty list, not an error.
pub fn list_models(provider: Option<&str>) -> Vec<ModelEntry> {
    let providers: Vec<&catalog::CatalogProvider> = match provider {
        Some(id) => catalog::find_provider(id).into_iter().collect(),
        None => catalog::SUPPORTED_PROVIDERS.iter().collect(),
    };

    providers
        .into_iter()
        .flat_map(|provider| {
            provider.models.iter().map(|model| ModelEntry {
                id: model.id.to_string(),
                label: model.label.to_string(),
                provider: provider.id.to_string(),
                provider_name: provider.name.to_string(),
            })
        })
        .collect()
}

/// Resolve the secret for a provider: the named environment variable when
/// one is configured, falling back to the provider's catalog variable.
pub fn resolve_api_key(provider: &str, env_var: Option<&str>) -> Option<String> {
    if let Some(var) = env_var.filter(|name| !name.is_empty()) {
        if let Some(key) = env_non_empty(var) {
            return Some(key);
        }
    }
    catalog::find_provider(provider).and_then(|info| env_non_empty(info.env_var))
}

/// Connectivity probing over the completion capability, with a per-provider
/// last-known-good map.
pub struct ProviderRegistry {
    completion: Arc<dyn CompletionPort>,
    online: Mutex<HashMap<String, bool>>,
}

impl ProviderRegistry {
    pub fn new(completion: Arc<dyn CompletionPort>) -> Self {
        Self {
            completion,
            online: Mutex::new(HashMap::new()),
        }
    }

    /// Last known connectivity of a provider; unknown means offline.
    pub fn is_online(&self, provider: &str) -> bool {
        self.online
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .copied()
            .unwrap_or(false)
    }

    /// Overwrite the recorded connectivity of a provider.
    pub fn set_online(&self, provider: &str, online: bool) {
        self.online
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), online);
    }

    /// Probe a provider with one minimal completion call.
    ///
    /// Resolves the secret from the explicit argument or the provider's
    /// environment variable; a missing key or any call failure records the
    /// provider as offline.
    pub async fn check_connectivity(&self, provider: &str, api_key: Option<&str>) -> bool {
        let Some(info) = catalog::find_provider(provider) else {
            return false;
        };

        let key = api_key
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| env_non_empty(info.env_var));
        let Some(key) = key else {
            self.set_online(provider, false);
            return false;
        };

        let Some(probe_model) = info.models.first() else {
            return false;
        };

        let request = CompletionRequest {
            provider: provider.to_string(),
            model: catalog::model_string(provider, probe_model.id),
            api_key: key,
            messages: vec![ProviderMessage::user(PROBE_PROMPT)],
            temperature: None,
            max_tokens: Some(PROBE_MAX_TOKENS),
            timeout: CONNECTIVITY_TIMEOUT,
        };

        let online = self.completion.complete(request).await.is_ok();
        self.set_online(provider, online);
        online
    }
}
