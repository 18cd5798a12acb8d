//! Shared in-memory port fakes for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;

use crate::ports::{
    BackendError, CompletionPort, CompletionReply, CompletionRequest, DocumentStore, Fingerprint,
    LoadedDocument, StoreDocument, StoreError, TokenUsage,
};

fn fingerprint_for(version: u64) -> Fingerprint {
    Fingerprint::new(UNIX_EPOCH + Duration::from_nanos(version))
}

/// In-memory [`DocumentStore`] with fabricated fingerprints, load counting
/// and save-failure injection.
#[derive(Default)]
pub(crate) struct MemoryStore {
    docs: Mutex<HashMap<StoreDocument, (serde_json::Value, u64)>>,
    version: AtomicU64,
    loads: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a document directly, bumping its fingerprint as an external
    /// writer would.
    pub fn seed(&self, doc: StoreDocument, value: serde_json::Value) {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(doc, (value, version));
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, doc: StoreDocument) -> Result<Option<LoadedDocument>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&doc)
            .map(|(value, version)| LoadedDocument {
                value: value.clone(),
                fingerprint: fingerprint_for(*version),
            }))
    }

    async fn save(
        &self,
        doc: StoreDocument,
        value: &serde_json::Value,
    ) -> Result<Fingerprint, StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io("save disabled".to_string()));
        }
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(doc, (value.clone(), version));
        Ok(fingerprint_for(version))
    }

    async fn fingerprint(&self, doc: StoreDocument) -> Result<Option<Fingerprint>, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&doc)
            .map(|(_, version)| fingerprint_for(*version)))
    }
}

/// Scripted [`CompletionPort`] that records every request it receives.
pub(crate) struct MockCompletion {
    reply: Mutex<Result<CompletionReply, BackendError>>,
    next_error: Mutex<Option<BackendError>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    /// Always succeed with the given text and no usage numbers.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(CompletionReply {
                text: text.to_string(),
                usage: None,
            })),
            next_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always succeed with the given text and usage numbers.
    pub fn replying_with_usage(text: &str, usage: TokenUsage) -> Self {
        let mock = Self::replying(text);
        *mock.reply.lock().unwrap_or_else(PoisonError::into_inner) = Ok(CompletionReply {
            text: text.to_string(),
            usage: Some(usage),
        });
        mock
    }

    /// Always fail with the given error.
    pub fn failing(error: BackendError) -> Self {
        Self {
            reply: Mutex::new(Err(error)),
            next_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next call only, then fall back to the standing reply.
    pub fn fail_next(&self, error: BackendError) {
        *self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl CompletionPort for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, BackendError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if let Some(error) = self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }

        self.reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
