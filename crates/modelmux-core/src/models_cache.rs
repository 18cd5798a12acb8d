//! Models cache document.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a refreshed model list stays fresh.
pub const MODELS_CACHE_TTL: Duration = Duration::from_secs(60 * 30);

/// A normalized model record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    pub label: String,
    pub provider: String,
    pub provider_name: String,
}

/// The persisted models cache: a wholesale-replaced list plus the unix-millis
/// timestamp of the last refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelsCache {
    pub models: Vec<ModelEntry>,
    pub last_updated: Option<i64>,
}

impl ModelsCache {
    /// Whether the cache must be refreshed: never updated, or older than
    /// `ttl` relative to `now_millis`.
    pub fn is_stale(&self, ttl: Duration, now_millis: i64) -> bool {
        match self.last_updated {
            None => true,
            Some(last) => now_millis - last > i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }
}
