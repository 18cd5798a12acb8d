//! Request telemetry and the in-memory health snapshot.
//!
//! Every chat invocation produces one request event on entry and exactly one
//! success or error event on exit, all gated by the persisted logging
//! toggles. The most recent success and the most recent error are retained
//! for status reporting; a disabled toggle skips the snapshot update along
//! with the log event.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;

use crate::config::LoggingToggles;
use crate::ports::TokenUsage;

/// Token counts of the most recent successful completion.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenBreakdown {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<TokenUsage> for TokenBreakdown {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Most recent successful completion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub timestamp: i64,
    pub provider: String,
    pub model: String,
    pub tokens: TokenBreakdown,
}

/// Most recent error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub timestamp: i64,
    pub message: String,
    pub context: serde_json::Value,
}

/// Health info surfaced in the state payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub last_successful_completion: Option<CompletionRecord>,
    pub last_error: Option<ErrorRecord>,
}

/// Process-wide activity tracker.
#[derive(Debug, Default)]
pub struct ActivityLog {
    last_success: Mutex<Option<CompletionRecord>>,
    last_error: Mutex<Option<ErrorRecord>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log an incoming chat request.
    pub fn record_request(
        &self,
        toggles: &LoggingToggles,
        incoming_model: &str,
        provider: &str,
        model: &str,
        message_count: usize,
    ) {
        if !toggles.log_requests {
            return;
        }
        tracing::info!(
            target: "modelmux::request",
            incoming_model,
            provider,
            model,
            message_count,
            status = "processing",
            "chat completion request"
        );
    }

    /// Log a successful completion and retain it as the latest success.
    pub fn record_success(
        &self,
        toggles: &LoggingToggles,
        provider: &str,
        model: &str,
        usage: TokenUsage,
    ) {
        if !toggles.enabled {
            return;
        }
        tracing::info!(
            target: "modelmux::request",
            provider,
            model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "chat completion succeeded"
        );

        let record = CompletionRecord {
            timestamp: Utc::now().timestamp_millis(),
            provider: provider.to_string(),
            model: model.to_string(),
            tokens: usage.into(),
        };
        *self
            .last_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(record);
    }

    /// Log an error and retain it as the latest error.
    pub fn record_error(
        &self,
        toggles: &LoggingToggles,
        message: &str,
        context: serde_json::Value,
    ) {
        if !toggles.log_errors {
            return;
        }
        tracing::error!(
            target: "modelmux::request",
            message,
            context = %context,
            "chat completion failed"
        );

        let record = ErrorRecord {
            timestamp: Utc::now().timestamp_millis(),
            message: message.to_string(),
            context,
        };
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(record);
    }

    /// Current health snapshot.
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            last_successful_completion: self
                .last_success
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}
