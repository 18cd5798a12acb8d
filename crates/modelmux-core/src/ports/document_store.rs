//! Document store trait definition.
//!
//! This port defines the interface for the persistent JSON documents that
//! back the emulator state. Implementations handle all storage details
//! internally; callers see whole documents plus an opaque modification
//! fingerprint used for cache invalidation.

use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

/// The logical documents the emulator persists.
///
/// Each document is an independent resource; there is no cross-document
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreDocument {
    /// Singleton configuration record.
    Config,
    /// Cached normalized model list with its refresh timestamp.
    ModelsCache,
    /// Ordered list of saved configuration presets.
    Presets,
}

impl StoreDocument {
    /// Stable file name of the document inside the configuration directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Config => "default.json",
            Self::ModelsCache => "models-cache.json",
            Self::Presets => "saved-configs.json",
        }
    }
}

/// Opaque modification fingerprint of a stored document.
///
/// Two loads of an unchanged document compare equal; any successful save
/// produces the fingerprint of the bytes just written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(SystemTime);

impl Fingerprint {
    pub const fn new(modified: SystemTime) -> Self {
        Self(modified)
    }
}

/// A document value together with the fingerprint it was read at.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub value: serde_json::Value,
    pub fingerprint: Fingerprint,
}

/// Storage failures surfaced to callers.
///
/// A missing or unparseable document is NOT an error: `load` reports it as
/// `Ok(None)` and callers fall back to defaults.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("storage I/O failure: {0}")]
    Io(String),

    #[error("document serialization failed: {0}")]
    Serialization(String),
}

/// Persistent storage for the emulator's JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document.
    ///
    /// Returns `Ok(None)` when the document does not exist or cannot be
    /// parsed as JSON.
    async fn load(&self, doc: StoreDocument) -> Result<Option<LoadedDocument>, StoreError>;

    /// Replace a document wholesale and return the new fingerprint.
    async fn save(
        &self,
        doc: StoreDocument,
        value: &serde_json::Value,
    ) -> Result<Fingerprint, StoreError>;

    /// Current fingerprint of a document, `None` if it does not exist.
    async fn fingerprint(&self, doc: StoreDocument) -> Result<Option<Fingerprint>, StoreError>;
}
