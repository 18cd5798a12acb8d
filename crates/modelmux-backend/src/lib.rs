//! HTTP completion backend.
//!
//! Every supported provider exposes an OpenAI-compatible chat completions
//! endpoint; this client only has to pick the right base URL, strip the
//! internal routing prefix off the model string and translate transport
//! failures into messages the error classifier recognizes.

#![deny(unused_crate_dependencies)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use modelmux_core::ports::{
    BackendError, CompletionPort, CompletionReply, CompletionRequest, ProviderMessage, TokenUsage,
};

/// OpenAI-compatible chat completions base URL for a provider.
fn base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "anthropic" => Some("https://api.anthropic.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "mistral" => Some("https://api.mistral.ai/v1"),
        "google" => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
        "cohere" => Some("https://api.cohere.ai/compatibility/v1"),
        "together_ai" => Some("https://api.together.xyz/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "cerebras" => Some("https://api.cerebras.ai/v1"),
        _ => None,
    }
}

/// Undo the internal routing prefix before the model id goes on the wire.
///
/// Google routes as `gemini/<model>`, the other prefixed providers as
/// `<provider>/<model>`; OpenAI and Anthropic models arrive unprefixed.
fn wire_model<'a>(provider: &str, model: &'a str) -> &'a str {
    let prefix = match provider {
        "google" => "gemini/",
        "groq" => "groq/",
        "mistral" => "mistral/",
        "cohere" => "cohere/",
        "together_ai" => "together_ai/",
        "openrouter" => "openrouter/",
        "deepseek" => "deepseek/",
        "cerebras" => "cerebras/",
        _ => return model,
    };
    model.strip_prefix(prefix).unwrap_or(model)
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ProviderMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: Option<WireErrorBody>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    message: Option<String>,
}

fn reply_from(response: WireResponse) -> CompletionReply {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default();
    CompletionReply {
        text,
        usage: response.usage,
    }
}

/// Failure message for an HTTP error status, preferring the provider's own
/// error message and otherwise synthesizing one that classifies correctly.
fn status_message(status: u16, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<WireError>(body) {
        if let Some(message) = parsed.error.and_then(|e| e.message) {
            if !message.is_empty() {
                return message;
            }
        }
    }
    match status {
        400 => "Bad request".to_string(),
        401 => "Unauthorized: invalid API key".to_string(),
        403 => "Forbidden".to_string(),
        404 => "Not found".to_string(),
        429 => "Rate limit exceeded".to_string(),
        500..=599 => "Provider service unavailable".to_string(),
        _ => format!("Provider returned HTTP {status}"),
    }
}

fn transport_error(error: &reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::with_code(format!("Request timeout: {error}"), "ETIMEDOUT")
    } else if error.is_connect() {
        BackendError::with_code(format!("Connection failed: {error}"), "ECONNREFUSED")
    } else {
        BackendError::new(error.to_string())
    }
}

/// Reqwest-backed [`CompletionPort`] implementation.
#[derive(Debug, Clone, Default)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
}

impl HttpCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionPort for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, BackendError> {
        let Some(base) = base_url(&request.provider) else {
            return Err(BackendError::new(format!(
                "Provider '{}' is not supported",
                request.provider
            )));
        };

        let payload = WireRequest {
            model: wire_model(&request.provider, &request.model),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            target: "modelmux::backend",
            provider = %request.provider,
            model = payload.model,
            "dispatching completion"
        );

        let response = self
            .http
            .post(format!("{base}/chat/completions"))
            .bearer_auth(&request.api_key)
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            return Err(BackendError::new(status_message(status.as_u16(), &bytes)));
        }

        let parsed: WireResponse = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::new(format!("Malformed provider response: {e}")))?;
        Ok(reply_from(parsed))
    }
}
