//! Configuration domain types.
//!
//! The configuration is a singleton JSON document. Keys are camelCase on
//! disk and over the wire; unknown keys written by other tools survive a
//! full-document rewrite through the flattened `extra` map.

use serde::{Deserialize, Serialize};

/// Default port for the OpenAI-compatible endpoint.
pub const DEFAULT_PORT: u16 = 11434;

/// Default provider/model/env-var selection.
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// The provider/model/secret-env-var triple used by Start and `lastConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSelection {
    pub provider: String,
    pub model: String,
    pub api_key_env_var: String,
}

/// Independent logging toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingToggles {
    pub enabled: bool,
    pub log_requests: bool,
    pub log_errors: bool,
}

impl Default for LoggingToggles {
    fn default() -> Self {
        Self {
            enabled: true,
            log_requests: true,
            log_errors: true,
        }
    }
}

/// The persisted configuration record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmulatorConfig {
    pub port: u16,
    pub provider: String,
    pub model: String,
    pub api_key_env_var: String,
    pub emulator_active: bool,
    /// Snapshot of the most recent successful emulator start, if any.
    pub last_config: Option<ProviderSelection>,
    pub logging: LoggingToggles,
    /// Keys we do not model. Preserved verbatim across rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EmulatorConfig {
    /// Compiled-in defaults, used when no persisted copy exists.
    pub fn with_defaults() -> Self {
        Self {
            port: DEFAULT_PORT,
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env_var: DEFAULT_API_KEY_ENV_VAR.to_string(),
            emulator_active: false,
            last_config: None,
            logging: LoggingToggles::default(),
            extra: serde_json::Map::new(),
        }
    }

    /// Merge a partial update into this config (shallow key overwrite).
    pub fn merge(&mut self, update: &ConfigUpdate) {
        if let Some(port) = update.port {
            self.port = port;
        }
        if let Some(ref provider) = update.provider {
            self.provider.clone_from(provider);
        }
        if let Some(ref model) = update.model {
            self.model.clone_from(model);
        }
        if let Some(ref env_var) = update.api_key_env_var {
            self.api_key_env_var.clone_from(env_var);
        }
        if let Some(active) = update.emulator_active {
            self.emulator_active = active;
        }
        if let Some(ref last_config) = update.last_config {
            self.last_config.clone_from(last_config);
        }
        if let Some(logging) = update.logging {
            self.logging = logging;
        }
    }
}

/// Partial configuration update.
///
/// `last_config` is doubly optional: `None` leaves the stored value alone,
/// `Some(None)` clears it, `Some(Some(sel))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub port: Option<u16>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key_env_var: Option<String>,
    pub emulator_active: Option<bool>,
    pub last_config: Option<Option<ProviderSelection>>,
    pub logging: Option<LoggingToggles>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmulatorConfig::with_defaults();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.api_key_env_var, "OPENAI_API_KEY");
        assert!(!config.emulator_active);
        assert!(config.last_config.is_none());
        assert!(config.logging.enabled);
        assert!(config.logging.log_requests);
        assert!(config.logging.log_errors);
    }

    #[test]
    fn test_merge_overwrites_only_provided_fields() {
        let mut config = EmulatorConfig::with_defaults();
        let update = ConfigUpdate {
            provider: Some("groq".to_string()),
            model: Some("llama-3.1-8b-instant".to_string()),
            ..Default::default()
        };
        config.merge(&update);

        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_key_env_var, "OPENAI_API_KEY");
    }

    #[test]
    fn test_merge_sets_last_config() {
        let mut config = EmulatorConfig::with_defaults();
        let selection = ProviderSelection {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env_var: "GROQ_API_KEY".to_string(),
        };
        config.merge(&ConfigUpdate {
            emulator_active: Some(true),
            last_config: Some(Some(selection.clone())),
            ..Default::default()
        });

        assert!(config.emulator_active);
        assert_eq!(config.last_config, Some(selection));
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let raw = serde_json::json!({
            "port": 4000,
            "provider": "mistral",
            "customFlag": {"nested": true}
        });
        let mut config: EmulatorConfig = serde_json::from_value(raw).unwrap();
        config.merge(&ConfigUpdate {
            model: Some("mistral-small-latest".to_string()),
            ..Default::default()
        });

        let out = serde_json::to_value(&config).unwrap();
        assert_eq!(out["port"], 4000);
        assert_eq!(out["model"], "mistral-small-latest");
        assert_eq!(out["customFlag"]["nested"], true);
    }

    #[test]
    fn test_camel_case_keys() {
        let out = serde_json::to_value(EmulatorConfig::with_defaults()).unwrap();
        assert!(out.get("apiKeyEnvVar").is_some());
        assert!(out.get("emulatorActive").is_some());
        assert!(out.get("lastConfig").is_some());
        assert_eq!(out["logging"]["logRequests"], true);
    }
}
