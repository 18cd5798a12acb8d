//! Static provider catalog.
//!
//! The catalog is compiled in: each supported provider with its display
//! name, the environment variable holding its secret, and the models it
//! serves. Connectivity state lives in [`crate::registry`], not here.

/// One model offered by a provider.
#[derive(Debug, Clone, Copy)]
pub struct CatalogModel {
    pub id: &'static str,
    pub label: &'static str,
}

/// A supported provider.
#[derive(Debug, Clone, Copy)]
pub struct CatalogProvider {
    pub id: &'static str,
    pub name: &'static str,
    pub env_var: &'static str,
    pub models: &'static [CatalogModel],
}

macro_rules! models {
    ($(($id:expr, $label:expr)),* $(,)?) => {
        &[$(CatalogModel { id: $id, label: $label }),*]
    };
}

/// All supported providers, in presentation order.
pub static SUPPORTED_PROVIDERS: &[CatalogProvider] = &[
    CatalogProvider {
        id: "openai",
        name: "OpenAI",
        env_var: "OPENAI_API_KEY",
        models: models![
            ("gpt-4", "GPT-4"),
            ("gpt-4-turbo", "GPT-4 Turbo"),
            ("gpt-4o", "GPT-4o"),
            ("gpt-4o-mini", "GPT-4o Mini"),
            ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
            ("o1", "o1"),
            ("o1-mini", "o1 Mini"),
            ("o1-preview", "o1 Preview"),
        ],
    },
    CatalogProvider {
        id: "anthropic",
        name: "Anthropic",
        env_var: "ANTHROPIC_API_KEY",
        models: models![
            ("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet"),
            ("claude-3-5-haiku-20241022", "Claude 3.5 Haiku"),
            ("claude-3-opus-20240229", "Claude 3 Opus"),
            ("claude-3-sonnet-20240229", "Claude 3 Sonnet"),
            ("claude-3-haiku-20240307", "Claude 3 Haiku"),
        ],
    },
    CatalogProvider {
        id: "groq",
        name: "Groq",
        env_var: "GROQ_API_KEY",
        models: models![
            ("llama-3.3-70b-versatile", "Llama 3.3 70B"),
            ("llama-3.1-70b-versatile", "Llama 3.1 70B"),
            ("llama-3.1-8b-instant", "Llama 3.1 8B"),
            ("mixtral-8x7b-32768", "Mixtral 8x7B"),
            ("gemma2-9b-it", "Gemma 2 9B"),
        ],
    },
    CatalogProvider {
        id: "mistral",
        name: "Mistral",
        env_var: "MISTRAL_API_KEY",
        models: models![
            ("mistral-large-latest", "Mistral Large"),
            ("mistral-medium-latest", "Mistral Medium"),
            ("mistral-small-latest", "Mistral Small"),
            ("open-mixtral-8x22b", "Mixtral 8x22B"),
            ("open-mixtral-8x7b", "Mixtral 8x7B"),
            ("codestral-latest", "Codestral"),
        ],
    },
    CatalogProvider {
        id: "google",
        name: "Google (Gemini)",
        env_var: "GEMINI_API_KEY",
        models: models![
            ("gemini-1.5-pro", "Gemini 1.5 Pro"),
            ("gemini-1.5-flash", "Gemini 1.5 Flash"),
            ("gemini-1.0-pro", "Gemini 1.0 Pro"),
        ],
    },
    CatalogProvider {
        id: "cohere",
        name: "Cohere",
        env_var: "COHERE_API_KEY",
        models: models![
            ("command-r-plus", "Command R+"),
            ("command-r", "Command R"),
            ("command", "Command"),
            ("command-light", "Command Light"),
        ],
    },
    CatalogProvider {
        id: "together_ai",
        name: "Together AI",
        env_var: "TOGETHER_API_KEY",
        models: models![
            ("meta-llama/Llama-3.3-70B-Instruct-Turbo", "Llama 3.3 70B"),
            (
                "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo",
                "Llama 3.1 405B"
            ),
            ("mistralai/Mixtral-8x22B-Instruct-v0.1", "Mixtral 8x22B"),
            ("Qwen/Qwen2.5-72B-Instruct-Turbo", "Qwen 2.5 72B"),
        ],
    },
    CatalogProvider {
        id: "openrouter",
        name: "OpenRouter",
        env_var: "OPENROUTER_API_KEY",
        models: models![
            ("openai/gpt-4-turbo", "GPT-4 Turbo"),
            ("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet"),
            ("google/gemini-pro-1.5", "Gemini 1.5 Pro"),
            ("meta-llama/llama-3.1-405b-instruct", "Llama 3.1 405B"),
        ],
    },
    CatalogProvider {
        id: "deepseek",
        name: "DeepSeek",
        env_var: "DEEPSEEK_API_KEY",
        models: models![
            ("deepseek-chat", "DeepSeek Chat"),
            ("deepseek-coder", "DeepSeek Coder"),
        ],
    },
    CatalogProvider {
        id: "cerebras",
        name: "Cerebras",
        env_var: "CEREBRAS_API_KEY",
        models: models![
            ("llama3.1-8b", "Llama 3.1 8B"),
            ("llama3.1-70b", "Llama 3.1 70B"),
        ],
    },
];

/// Look up a provider by id.
pub fn find_provider(id: &str) -> Option<&'static CatalogProvider> {
    SUPPORTED_PROVIDERS.iter().find(|p| p.id == id)
}

/// Display name for a provider id; falls back to the id itself.
pub fn display_name(id: &str) -> &str {
    find_provider(id).map_or(id, |p| p.name)
}

/// Routing model string for a provider/model combination.
///
/// Most providers route as `provider/model`; OpenAI and Anthropic pass
/// through unprefixed, and an unknown provider passes through as a safe
/// default. Google routes under the `gemini/` prefix.
pub fn model_string(provider: &str, model: &str) -> String {
    match provider {
        "openai" | "anthropic" => model.to_string(),
        "google" => format!("gemini/{model}"),
        "groq" | "mistral" | "cohere" | "together_ai" | "openrouter" | "deepseek" | "cerebras" => {
            format!("{provider}/{model}")
        }
        _ => model.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_ten_providers_with_models() {
        assert_eq!(SUPPORTED_PROVIDERS.len(), 10);
        for provider in SUPPORTED_PROVIDERS {
            assert!(!provider.models.is_empty(), "{} has no models", provider.id);
            assert!(!provider.env_var.is_empty());
        }
    }

    #[test]
    fn test_model_string_prefixing() {
        assert_eq!(model_string("openai", "gpt-4"), "gpt-4");
        assert_eq!(
            model_string("anthropic", "claude-3-opus-20240229"),
            "claude-3-opus-20240229"
        );
        assert_eq!(model_string("groq", "x"), "groq/x");
        assert_eq!(model_string("google", "gemini-1.5-pro"), "gemini/gemini-1.5-pro");
        assert_eq!(model_string("deepseek", "deepseek-chat"), "deepseek/deepseek-chat");
        // Unknown providers pass through unprefixed.
        assert_eq!(model_string("acme", "m1"), "m1");
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name("google"), "Google (Gemini)");
        assert_eq!(display_name("acme"), "acme");
    }
}
