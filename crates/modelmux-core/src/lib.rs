//! Core domain for the modelmux virtual-model emulator.
//!
//! Everything here is transport-agnostic: the HTTP layer and the concrete
//! provider/storage integrations live in sibling crates and plug in through
//! the traits under [`ports`].

#![deny(unused_crate_dependencies)]

pub mod adapter;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod health;
pub mod ids;
pub mod models_cache;
pub mod ports;
pub mod preset;
pub mod registry;
pub mod state;
pub mod tokens;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types for convenience
pub use adapter::{AdapterResponse, ChatAdapter, ValidationError, COMPLETION_TIMEOUT, validate_request};
pub use catalog::{CatalogModel, CatalogProvider, SUPPORTED_PROVIDERS, display_name, find_provider, model_string};
pub use classify::{ErrorCategory, classify};
pub use config::{
    ConfigUpdate, EmulatorConfig, LoggingToggles, ProviderSelection, DEFAULT_API_KEY_ENV_VAR,
    DEFAULT_MODEL, DEFAULT_PORT, DEFAULT_PROVIDER,
};
pub use health::{ActivityLog, CompletionRecord, ErrorRecord, HealthSnapshot, TokenBreakdown};
pub use models_cache::{ModelEntry, ModelsCache, MODELS_CACHE_TTL};
pub use ports::{
    BackendError, CompletionPort, CompletionReply, CompletionRequest, DocumentStore, Fingerprint,
    LoadedDocument, ProviderMessage, StoreDocument, StoreError, TokenUsage,
};
pub use preset::{Preset, PresetUpdate};
pub use registry::{
    ProviderListing, ProviderModel, ProviderRegistry, CONNECTIVITY_TIMEOUT, list_models,
    list_providers, resolve_api_key,
};
pub use state::ConfigState;
pub use tokens::estimate_tokens;

// Silence unused dev-dependency warnings until we add runtime-level tests
#[cfg(test)]
use tokio_test as _;
