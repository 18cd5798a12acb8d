//! OpenAI-compatible chat completion adapter.
//!
//! Validates an incoming chat request, resolves the configured provider and
//! secret, dispatches through the completion port and shapes either an
//! OpenAI-style completion body or a classified error body. The adapter is
//! framework-free: it consumes a parsed JSON body and produces a status code
//! plus body for the HTTP layer to send verbatim.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;

use crate::classify::{classify, ErrorCategory};
use crate::config::LoggingToggles;
use crate::health::ActivityLog;
use crate::ids;
use crate::ports::{BackendError, CompletionPort, CompletionRequest, ProviderMessage, TokenUsage};
use crate::registry::{resolve_api_key, ProviderRegistry};
use crate::state::ConfigState;
use crate::tokens::estimate_tokens;

/// Hard ceiling on a proxied completion call.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

const ENDPOINT: &str = "/v1/chat/completions";

/// A request rejected before reaching the backend. Always 400.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Status code and JSON body for the HTTP layer to send as-is.
#[derive(Debug, Clone)]
pub struct AdapterResponse {
    pub status: u16,
    pub body: Value,
}

fn error_body(message: &str, error_type: &str, code: Option<&str>) -> Value {
    let message = if message.is_empty() {
        "An error occurred"
    } else {
        message
    };
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "code": code,
        }
    })
}

/// JSON truthiness: null, false, 0, "" and empty containers are falsy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Validate an OpenAI-compatible chat completion request body.
pub fn validate_request(body: &Value) -> Result<(), ValidationError> {
    let Some(object) = body.as_object() else {
        return Err(ValidationError("Request body is required".to_string()));
    };
    if object.is_empty() {
        return Err(ValidationError("Request body is required".to_string()));
    }

    let model_ok = object
        .get("model")
        .and_then(Value::as_str)
        .is_some_and(|model| !model.trim().is_empty());
    if !model_ok {
        return Err(ValidationError("model field is required".to_string()));
    }

    let messages = object.get("messages");
    let prompt = object.get("prompt");
    if !messages.is_some_and(truthy) && !prompt.is_some_and(truthy) {
        return Err(ValidationError(
            "Either messages or prompt field is required".to_string(),
        ));
    }

    if let Some(messages) = messages.filter(|value| !value.is_null()) {
        let Some(list) = messages.as_array().filter(|list| !list.is_empty()) else {
            return Err(ValidationError(
                "messages must be a non-empty array".to_string(),
            ));
        };
        for message in list {
            let Some(fields) = message.as_object() else {
                return Err(ValidationError("Each message must be an object".to_string()));
            };
            let has_role = fields.contains_key("role");
            let has_content = fields.get("content").is_some_and(|c| !c.is_null());
            if !has_role || !has_content {
                return Err(ValidationError(
                    "Each message must have role and content fields".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn provider_messages(body: &Value) -> Vec<ProviderMessage> {
    if let Some(list) = body.get("messages").and_then(Value::as_array) {
        if !list.is_empty() {
            return list
                .iter()
                .map(|message| ProviderMessage {
                    role: message
                        .get("role")
                        .map(value_to_text)
                        .unwrap_or_else(|| "user".to_string()),
                    content: message.get("content").map(value_to_text).unwrap_or_default(),
                })
                .collect();
        }
    }
    let prompt = body.get("prompt").map(value_to_text).unwrap_or_default();
    vec![ProviderMessage::user(prompt)]
}

fn normalize_usage(reported: Option<TokenUsage>, messages: &[ProviderMessage], text: &str) -> TokenUsage {
    match reported {
        Some(mut usage) => {
            if usage.total_tokens == 0 {
                usage.total_tokens = usage.prompt_tokens + usage.completion_tokens;
            }
            usage
        }
        None => {
            let prompt_tokens: u32 = messages
                .iter()
                .map(|message| estimate_tokens(&message.content))
                .sum();
            let completion_tokens = estimate_tokens(text);
            TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }
        }
    }
}

/// The chat completion pipeline.
pub struct ChatAdapter {
    state: Arc<ConfigState>,
    registry: Arc<ProviderRegistry>,
    completion: Arc<dyn CompletionPort>,
    activity: Arc<ActivityLog>,
}

impl ChatAdapter {
    pub fn new(
        state: Arc<ConfigState>,
        registry: Arc<ProviderRegistry>,
        completion: Arc<dyn CompletionPort>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            state,
            registry,
            completion,
            activity,
        }
    }

    fn backend_failure(
        &self,
        toggles: &LoggingToggles,
        requested_model: &Value,
        error: &BackendError,
    ) -> AdapterResponse {
        self.activity.record_error(
            toggles,
            &error.message,
            json!({ "endpoint": ENDPOINT, "requestedModel": requested_model }),
        );
        let category = classify(error);
        AdapterResponse {
            status: category.status_code(),
            body: error_body(&error.message, category.as_str(), error.code.as_deref()),
        }
    }

    /// Handle one chat completion request end to end.
    ///
    /// Never returns an error: every failure mode is mapped to a status code
    /// and an OpenAI-style error body.
    pub async fn handle_chat_completion(&self, body: &Value) -> AdapterResponse {
        if !self.state.is_emulator_active() {
            return AdapterResponse {
                status: 503,
                body: error_body(
                    "Emulator is not active. Start it from the configuration UI.",
                    ErrorCategory::ServiceUnavailable.as_str(),
                    None,
                ),
            };
        }

        let config = self.state.get_config().await;
        let toggles = config.logging;
        let requested_model_raw = body.get("model").cloned().unwrap_or(Value::Null);

        if let Err(error) = validate_request(body) {
            self.activity.record_error(
                &toggles,
                &error.0,
                json!({ "endpoint": ENDPOINT, "requestedModel": requested_model_raw }),
            );
            return AdapterResponse {
                status: 400,
                body: error_body(&error.0, ErrorCategory::InvalidRequest.as_str(), None),
            };
        }

        let requested_model = body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let messages = provider_messages(body);
        let temperature = body.get("temperature").and_then(Value::as_f64);
        let max_tokens = body
            .get("max_tokens")
            .or_else(|| body.get("max_completion_tokens"))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());

        self.activity.record_request(
            &toggles,
            &requested_model,
            &config.provider,
            &config.model,
            messages.len(),
        );

        // Resolved from the environment only; the caller never supplies the
        // secret and it never appears in any payload.
        let Some(api_key) = resolve_api_key(&config.provider, Some(&config.api_key_env_var)) else {
            let error =
                BackendError::new(format!("No API key found for provider '{}'", config.provider));
            return self.backend_failure(&toggles, &requested_model_raw, &error);
        };

        let request = CompletionRequest {
            provider: config.provider.clone(),
            model: crate::catalog::model_string(&config.provider, &config.model),
            api_key,
            messages: messages.clone(),
            temperature,
            max_tokens,
            timeout: COMPLETION_TIMEOUT,
        };

        let reply = match self.completion.complete(request).await {
            Ok(reply) => reply,
            Err(error) => {
                self.registry.set_online(&config.provider, false);
                return self.backend_failure(&toggles, &requested_model_raw, &error);
            }
        };

        if reply.text.is_empty() {
            self.registry.set_online(&config.provider, false);
            let error = BackendError::new("Backend returned empty response");
            return self.backend_failure(&toggles, &requested_model_raw, &error);
        }
        self.registry.set_online(&config.provider, true);

        let usage = normalize_usage(reply.usage, &messages, &reply.text);
        self.activity
            .record_success(&toggles, &config.provider, &config.model, usage);

        AdapterResponse {
            status: 200,
            body: json!({
                "id": ids::completion_id(),
                "object": "chat.completion",
                "created": Utc::now().timestamp(),
                "model": requested_model,
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": reply.text,
                    },
                    "finish_reason": "stop",
                }],
                "usage": {
                    "prompt_tokens": usage.prompt_tokens,
                    "completion_tokens": usage.completion_tokens,
                    "total_tokens": usage.total_tokens,
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, MockCompletion};
    use crate::ports::StoreDocument;

    fn assert_invalid(body: Value, message: &str) {
        let error = validate_request(&body).unwrap_err();
        assert_eq!(error.0, message);
    }

    #[test]
    fn test_validate_rejects_empty_body() {
        assert_invalid(Value::Null, "Request body is required");
        assert_invalid(json!({}), "Request body is required");
    }

    #[test]
    fn test_validate_requires_model() {
        assert_invalid(json!({"messages": [{"role": "user", "content": "hi"}]}), "model field is required");
        assert_invalid(
            json!({"model": "   ", "messages": [{"role": "user", "content": "hi"}]}),
            "model field is required",
        );
        assert_invalid(
            json!({"model": 42, "messages": [{"role": "user", "content": "hi"}]}),
            "model field is required",
        );
    }

    #[test]
    fn test_validate_requires_messages_or_prompt() {
        assert_invalid(json!({"model": "gpt-4"}), "Either messages or prompt field is required");
        assert_invalid(
            json!({"model": "gpt-4", "messages": []}),
            "Either messages or prompt field is required",
        );
    }

    #[test]
    fn test_validate_messages_shape() {
        assert_invalid(
            json!({"model": "gpt-4", "messages": "hi"}),
            "messages must be a non-empty array",
        );
        assert_invalid(
            json!({"model": "gpt-4", "messages": ["hi"]}),
            "Each message must be an object",
        );
        assert_invalid(
            json!({"model": "gpt-4", "messages": [{"role": "user"}]}),
            "Each message must have role and content fields",
        );
        assert_invalid(
            json!({"model": "gpt-4", "messages": [{"content": "hi"}]}),
            "Each message must have role and content fields",
        );
        assert_invalid(
            json!({"model": "gpt-4", "messages": [{"role": "user", "content": null}]}),
            "Each message must have role and content fields",
        );
    }

    #[test]
    fn test_validate_accepts_prompt_only() {
        assert!(validate_request(&json!({"model": "gpt-4", "prompt": "hi"})).is_ok());
    }

    #[test]
    fn test_normalize_usage_fills_missing_total() {
        let usage = normalize_usage(
            Some(TokenUsage {
                prompt_tokens: 7,
                completion_tokens: 3,
                total_tokens: 0,
            }),
            &[],
            "",
        );
        assert_eq!(usage.total_tokens, 10);
    }

    #[test]
    fn test_normalize_usage_estimates_per_message() {
        let messages = vec![
            ProviderMessage::user("Test message"),
            ProviderMessage::user("abcde"),
        ];
        let usage = normalize_usage(None, &messages, "Hello!");
        // ceil(12/4) + ceil(5/4) prompt, ceil(6/4) completion.
        assert_eq!(usage.prompt_tokens, 5);
        assert_eq!(usage.completion_tokens, 2);
        assert_eq!(usage.total_tokens, 7);
    }

    struct Harness {
        adapter: ChatAdapter,
        registry: Arc<ProviderRegistry>,
        completion: Arc<MockCompletion>,
        activity: Arc<ActivityLog>,
    }

    async fn harness(completion: MockCompletion, active: bool, env_var: &str) -> Harness {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            StoreDocument::Config,
            json!({
                "provider": "openai",
                "model": "gpt-4",
                "apiKeyEnvVar": env_var,
                "emulatorActive": active,
            }),
        );
        let state = Arc::new(ConfigState::initialize(store).await);
        let completion = Arc::new(completion);
        let registry = Arc::new(ProviderRegistry::new(completion.clone()));
        let activity = Arc::new(ActivityLog::new());
        Harness {
            adapter: ChatAdapter::new(
                state,
                registry.clone(),
                completion.clone(),
                activity.clone(),
            ),
            registry,
            completion,
            activity,
        }
    }

    fn chat_body() -> Value {
        json!({
            "model": "my-alias",
            "messages": [{"role": "user", "content": "Test message"}],
        })
    }

    #[tokio::test]
    async fn test_inactive_emulator_rejected() {
        let h = harness(MockCompletion::replying("hello"), false, "UNSET_VAR").await;
        let response = h.adapter.handle_chat_completion(&chat_body()).await;
        assert_eq!(response.status, 503);
        assert_eq!(
            response.body["error"]["message"],
            "Emulator is not active. Start it from the configuration UI."
        );
        assert_eq!(response.body["error"]["type"], "service_unavailable");
        assert_eq!(h.completion.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_error_is_400_and_recorded() {
        std::env::set_var("ADAPTER_TEST_KEY_VALIDATE", "sk-test");
        let h = harness(
            MockCompletion::replying("hello"),
            true,
            "ADAPTER_TEST_KEY_VALIDATE",
        )
        .await;
        let response = h
            .adapter
            .handle_chat_completion(&json!({"model": "gpt-4"}))
            .await;
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"]["type"], "invalid_request_error");

        let error = h.activity.snapshot().last_error.unwrap();
        assert_eq!(error.message, "Either messages or prompt field is required");
        assert_eq!(error.context["endpoint"], ENDPOINT);
    }

    #[tokio::test]
    async fn test_successful_completion_shape() {
        std::env::set_var("ADAPTER_TEST_KEY_OK", "sk-test");
        let h = harness(
            MockCompletion::replying_with_usage(
                "Hello there!",
                TokenUsage {
                    prompt_tokens: 9,
                    completion_tokens: 4,
                    total_tokens: 13,
                },
            ),
            true,
            "ADAPTER_TEST_KEY_OK",
        )
        .await;

        let response = h
            .adapter
            .handle_chat_completion(&json!({
                "model": "my-alias",
                "messages": [{"role": "user", "content": "Test message"}],
                "temperature": 0.5,
                "max_tokens": 64,
            }))
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body["object"], "chat.completion");
        // The response echoes the requested model, not the configured one.
        assert_eq!(response.body["model"], "my-alias");
        assert!(response.body["id"]
            .as_str()
            .unwrap()
            .starts_with("chatcmpl-"));
        assert_eq!(
            response.body["choices"][0]["message"]["content"],
            "Hello there!"
        );
        assert_eq!(response.body["choices"][0]["finish_reason"], "stop");
        assert_eq!(response.body["usage"]["total_tokens"], 13);

        // The backend call used the configured model and options.
        let request = h.completion.last_request().unwrap();
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.api_key, "sk-test");
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.timeout, COMPLETION_TIMEOUT);

        assert!(h.registry.is_online("openai"));
        assert!(h.activity.snapshot().last_successful_completion.is_some());
    }

    #[tokio::test]
    async fn test_estimated_usage_when_backend_reports_none() {
        std::env::set_var("ADAPTER_TEST_KEY_EST", "sk-test");
        let h = harness(MockCompletion::replying("Hello!"), true, "ADAPTER_TEST_KEY_EST").await;
        let response = h.adapter.handle_chat_completion(&chat_body()).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["usage"]["prompt_tokens"], 3);
        assert_eq!(response.body["usage"]["completion_tokens"], 2);
        assert_eq!(response.body["usage"]["total_tokens"], 5);
    }

    #[tokio::test]
    async fn test_prompt_converted_to_user_message() {
        std::env::set_var("ADAPTER_TEST_KEY_PROMPT", "sk-test");
        let h = harness(MockCompletion::replying("ok"), true, "ADAPTER_TEST_KEY_PROMPT").await;
        let response = h
            .adapter
            .handle_chat_completion(&json!({"model": "gpt-4", "prompt": "Hi there"}))
            .await;
        assert_eq!(response.status, 200);

        let request = h.completion.last_request().unwrap();
        assert_eq!(request.messages, vec![ProviderMessage::user("Hi there")]);
    }

    #[tokio::test]
    async fn test_max_completion_tokens_fallback() {
        std::env::set_var("ADAPTER_TEST_KEY_MCT", "sk-test");
        let h = harness(MockCompletion::replying("ok"), true, "ADAPTER_TEST_KEY_MCT").await;
        let mut body = chat_body();
        body["max_completion_tokens"] = json!(17);
        h.adapter.handle_chat_completion(&body).await;
        assert_eq!(h.completion.last_request().unwrap().max_tokens, Some(17));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_authentication_error() {
        std::env::remove_var("ADAPTER_TEST_KEY_MISSING");
        std::env::remove_var("OPENAI_API_KEY");
        let h = harness(
            MockCompletion::replying("ok"),
            true,
            "ADAPTER_TEST_KEY_MISSING",
        )
        .await;
        let response = h.adapter.handle_chat_completion(&chat_body()).await;
        assert_eq!(response.status, 401);
        assert_eq!(response.body["error"]["type"], "authentication_error");
        assert_eq!(
            response.body["error"]["message"],
            "No API key found for provider 'openai'"
        );
        assert_eq!(h.completion.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_error_classified_and_marks_offline() {
        std::env::set_var("ADAPTER_TEST_KEY_FAIL", "sk-test");
        let h = harness(
            MockCompletion::failing(BackendError::new("Invalid API key provided")),
            true,
            "ADAPTER_TEST_KEY_FAIL",
        )
        .await;
        let response = h.adapter.handle_chat_completion(&chat_body()).await;
        assert_eq!(response.status, 401);
        assert_eq!(response.body["error"]["type"], "authentication_error");
        assert!(!h.registry.is_online("openai"));

        let error = h.activity.snapshot().last_error.unwrap();
        assert_eq!(error.context["requestedModel"], "my-alias");
    }

    #[tokio::test]
    async fn test_network_code_maps_to_service_unavailable() {
        std::env::set_var("ADAPTER_TEST_KEY_NET", "sk-test");
        let h = harness(
            MockCompletion::failing(BackendError::with_code("socket closed", "ECONNRESET")),
            true,
            "ADAPTER_TEST_KEY_NET",
        )
        .await;
        let response = h.adapter.handle_chat_completion(&chat_body()).await;
        assert_eq!(response.status, 503);
        assert_eq!(response.body["error"]["code"], "ECONNRESET");
    }

    #[tokio::test]
    async fn test_empty_backend_text_is_service_unavailable() {
        std::env::set_var("ADAPTER_TEST_KEY_EMPTY", "sk-test");
        let h = harness(MockCompletion::replying(""), true, "ADAPTER_TEST_KEY_EMPTY").await;
        let response = h.adapter.handle_chat_completion(&chat_body()).await;
        assert_eq!(response.status, 503);
        assert_eq!(
            response.body["error"]["message"],
            "Backend returned empty response"
        );
        assert_eq!(response.body["error"]["type"], "service_unavailable");
        assert!(!h.registry.is_online("openai"));
    }
}
