//! Completion backend trait definition.
//!
//! The concrete provider integration is a black box behind this port: it
//! receives a fully resolved call (provider, pre-prefixed model string, the
//! secret, messages and options) and either returns generated text with
//! optional usage numbers or fails with a [`BackendError`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single message handed to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

impl ProviderMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage as reported by a backend (OpenAI field names).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// A fully resolved backend call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Provider id from the catalog (e.g. "openai", "groq").
    pub provider: String,
    /// Model string with the per-provider routing prefix already applied.
    pub model: String,
    /// The resolved secret. Never logged.
    pub api_key: String,
    pub messages: Vec<ProviderMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Hard ceiling on the outbound call; a hung provider must not stall
    /// the caller indefinitely.
    pub timeout: Duration,
}

/// Successful backend reply.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// A backend call failure.
///
/// Carries the raw failure message (matched by the error classifier) and an
/// optional provider-specific code such as a network errno name.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub code: Option<String>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

/// External completion capability.
#[async_trait]
pub trait CompletionPort: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, BackendError>;
}
