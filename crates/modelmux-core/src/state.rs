//! Config state: cached views of the persisted documents plus derived
//! runtime state.
//!
//! Each document has its own cache slot holding the last-known value and
//! the store fingerprint it was read at; a changed fingerprint triggers a
//! reload. The emulator activation flag is process-wide, initialized from
//! the persisted value and thereafter owned by Start/Stop so requests never
//! touch storage. A mutex per document serializes the read-modify-write
//! sequences; failed saves leave the cache untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::config::{ConfigUpdate, EmulatorConfig, ProviderSelection};
use crate::models_cache::{ModelEntry, ModelsCache};
use crate::ports::{DocumentStore, Fingerprint, StoreDocument, StoreError};
use crate::preset::{Preset, PresetUpdate};

struct Cached<T> {
    value: T,
    fingerprint: Fingerprint,
}

/// In-memory view of the persisted emulator state.
pub struct ConfigState {
    store: Arc<dyn DocumentStore>,
    config: Mutex<Option<Cached<EmulatorConfig>>>,
    models: Mutex<Option<Cached<ModelsCache>>>,
    presets: Mutex<Option<Cached<Vec<Preset>>>>,
    emulator_active: AtomicBool,
}

impl ConfigState {
    /// Build the state and seed the activation flag from the persisted
    /// configuration.
    pub async fn initialize(store: Arc<dyn DocumentStore>) -> Self {
        let state = Self {
            store,
            config: Mutex::new(None),
            models: Mutex::new(None),
            presets: Mutex::new(None),
            emulator_active: AtomicBool::new(false),
        };
        let active = state.get_config().await.emulator_active;
        state.emulator_active.store(active, Ordering::SeqCst);
        state
    }

    /// Fetch the cached value for a document, reloading when the store
    /// fingerprint moved. Returns `None` on miss or parse failure.
    async fn current<T>(&self, doc: StoreDocument, slot: &mut Option<Cached<T>>) -> Option<T>
    where
        T: DeserializeOwned + Clone,
    {
        if let Some(cached) = slot.as_ref() {
            if let Ok(Some(fingerprint)) = self.store.fingerprint(doc).await {
                if fingerprint == cached.fingerprint {
                    return Some(cached.value.clone());
                }
            }
        }

        match self.store.load(doc).await {
            Ok(Some(loaded)) => match serde_json::from_value::<T>(loaded.value) {
                Ok(value) => {
                    *slot = Some(Cached {
                        value: value.clone(),
                        fingerprint: loaded.fingerprint,
                    });
                    Some(value)
                }
                Err(_) => None,
            },
            _ => None,
        }
    }

    async fn persist<T>(
        &self,
        doc: StoreDocument,
        slot: &mut Option<Cached<T>>,
        value: T,
    ) -> Result<T, StoreError>
    where
        T: serde::Serialize + Clone,
    {
        let raw =
            serde_json::to_value(&value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let fingerprint = self.store.save(doc, &raw).await?;
        *slot = Some(Cached {
            value: value.clone(),
            fingerprint,
        });
        Ok(value)
    }

    // ----- Configuration ---------------------------------------------------

    /// Current configuration; compiled-in defaults on miss, never persisted
    /// implicitly.
    pub async fn get_config(&self) -> EmulatorConfig {
        let mut slot = self.config.lock().await;
        self.current(StoreDocument::Config, &mut slot)
            .await
            .unwrap_or_else(EmulatorConfig::with_defaults)
    }

    /// Merge a partial update over the current configuration and persist.
    pub async fn update_config(&self, update: &ConfigUpdate) -> Result<EmulatorConfig, StoreError> {
        let mut slot = self.config.lock().await;
        let mut config = self
            .current(StoreDocument::Config, &mut slot)
            .await
            .unwrap_or_else(EmulatorConfig::with_defaults);
        config.merge(update);
        self.persist(StoreDocument::Config, &mut slot, config).await
    }

    /// Whether chat completions are currently served.
    pub fn is_emulator_active(&self) -> bool {
        self.emulator_active.load(Ordering::SeqCst)
    }

    /// Persist the selection as active and flip the activation flag.
    ///
    /// Provider/model validity is the caller's responsibility (via the
    /// provider registry); this only records the outcome.
    pub async fn start_emulator(&self, selection: ProviderSelection) -> Result<(), StoreError> {
        self.update_config(&ConfigUpdate {
            provider: Some(selection.provider.clone()),
            model: Some(selection.model.clone()),
            api_key_env_var: Some(selection.api_key_env_var.clone()),
            emulator_active: Some(true),
            last_config: Some(Some(selection)),
            ..Default::default()
        })
        .await?;
        self.emulator_active.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Persist deactivation and flip the activation flag off.
    pub async fn stop_emulator(&self) -> Result<(), StoreError> {
        self.update_config(&ConfigUpdate {
            emulator_active: Some(false),
            ..Default::default()
        })
        .await?;
        self.emulator_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Snapshot of the most recent successful start, if any.
    pub async fn last_config(&self) -> Option<ProviderSelection> {
        self.get_config().await.last_config
    }

    // ----- Models cache ----------------------------------------------------

    /// Cached model list; empty with no timestamp on miss.
    pub async fn models_cache(&self) -> ModelsCache {
        let mut slot = self.models.lock().await;
        self.current(StoreDocument::ModelsCache, &mut slot)
            .await
            .unwrap_or_default()
    }

    /// Whether the model cache must be refreshed.
    pub async fn is_models_cache_stale(&self, ttl: Duration) -> bool {
        self.models_cache()
            .await
            .is_stale(ttl, Utc::now().timestamp_millis())
    }

    /// Replace the cached model list wholesale with a fresh timestamp.
    pub async fn save_models_cache(
        &self,
        models: Vec<ModelEntry>,
    ) -> Result<ModelsCache, StoreError> {
        let cache = ModelsCache {
            models,
            last_updated: Some(Utc::now().timestamp_millis()),
        };
        let mut slot = self.models.lock().await;
        self.persist(StoreDocument::ModelsCache, &mut slot, cache)
            .await
    }

    // ----- Presets ---------------------------------------------------------

    /// All presets in insertion order.
    pub async fn presets(&self) -> Vec<Preset> {
        let mut slot = self.presets.lock().await;
        self.current(StoreDocument::Presets, &mut slot)
            .await
            .unwrap_or_default()
    }

    /// Create a preset with a fresh id and persist the list.
    pub async fn add_preset(
        &self,
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key_env_var: impl Into<String>,
    ) -> Result<Preset, StoreError> {
        let mut slot = self.presets.lock().await;
        let mut list = self
            .current::<Vec<Preset>>(StoreDocument::Presets, &mut slot)
            .await
            .unwrap_or_default();
        let preset = Preset::create(name, provider, model, api_key_env_var);
        list.push(preset.clone());
        self.persist(StoreDocument::Presets, &mut slot, list).await?;
        Ok(preset)
    }

    /// Apply a field-level update to a preset. `Ok(None)` if the id is
    /// unknown.
    pub async fn update_preset(
        &self,
        id: &str,
        update: &PresetUpdate,
    ) -> Result<Option<Preset>, StoreError> {
        let mut slot = self.presets.lock().await;
        let mut list = self
            .current::<Vec<Preset>>(StoreDocument::Presets, &mut slot)
            .await
            .unwrap_or_default();
        let Some(preset) = list.iter_mut().find(|preset| preset.id == id) else {
            return Ok(None);
        };
        preset.apply(update);
        let updated = preset.clone();
        self.persist(StoreDocument::Presets, &mut slot, list).await?;
        Ok(Some(updated))
    }

    /// Remove a preset by id. `Ok(false)` if the id is unknown.
    pub async fn delete_preset(&self, id: &str) -> Result<bool, StoreError> {
        let mut slot = self.presets.lock().await;
        let mut list = self
            .current::<Vec<Preset>>(StoreDocument::Presets, &mut slot)
            .await
            .unwrap_or_default();
        let before = list.len();
        list.retain(|preset| preset.id != id);
        if list.len() == before {
            return Ok(false);
        }
        self.persist(StoreDocument::Presets, &mut slot, list).await?;
        Ok(true)
    }

    /// Look up a preset by id.
    pub async fn preset_by_id(&self, id: &str) -> Option<Preset> {
        self.presets()
            .await
            .into_iter()
            .find(|preset| preset.id == id)
    }
}
