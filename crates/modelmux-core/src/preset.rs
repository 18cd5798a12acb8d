//! Saved configuration presets.

use serde::{Deserialize, Serialize};

use crate::ids;

/// A named, persisted provider+model+secret-env-var shortcut.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_key_env_var: String,
    /// Keys we do not model. Preserved verbatim across rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Preset {
    /// Create a preset with a freshly generated `cfg-` id.
    pub fn create(
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key_env_var: impl Into<String>,
    ) -> Self {
        Self {
            id: ids::preset_id(),
            name: name.into(),
            provider: provider.into(),
            model: model.into(),
            api_key_env_var: api_key_env_var.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Apply a field-level update.
    ///
    /// Name, provider and model are only replaced by non-empty values; the
    /// API-key-env-var field is replaced whenever it is provided, even by an
    /// empty string. The asymmetry allows explicit clearing of the env-var
    /// field only.
    pub fn apply(&mut self, update: &PresetUpdate) {
        if let Some(ref name) = update.name {
            if !name.is_empty() {
                self.name.clone_from(name);
            }
        }
        if let Some(ref provider) = update.provider {
            if !provider.is_empty() {
                self.provider.clone_from(provider);
            }
        }
        if let Some(ref model) = update.model {
            if !model.is_empty() {
                self.model.clone_from(model);
            }
        }
        if let Some(ref env_var) = update.api_key_env_var {
            self.api_key_env_var.clone_from(env_var);
        }
    }
}

/// Partial preset update; absent fields leave the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct PresetUpdate {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key_env_var: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Preset {
        Preset::create("n", "openai", "gpt-4", "OPENAI_API_KEY")
    }

    #[test]
    fn test_create_generates_cfg_id() {
        let preset = sample();
        let mut parts = preset.id.splitn(3, '-');
        assert_eq!(parts.next(), Some("cfg"));
        let millis = parts.next().unwrap();
        assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()));
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_apply_skips_empty_name_provider_model() {
        let mut preset = sample();
        preset.apply(&PresetUpdate {
            name: Some(String::new()),
            provider: Some(String::new()),
            model: Some(String::new()),
            api_key_env_var: None,
        });

        assert_eq!(preset.name, "n");
        assert_eq!(preset.provider, "openai");
        assert_eq!(preset.model, "gpt-4");
        assert_eq!(preset.api_key_env_var, "OPENAI_API_KEY");
    }

    #[test]
    fn test_apply_clears_env_var_with_empty_string() {
        let mut preset = sample();
        preset.apply(&PresetUpdate {
            api_key_env_var: Some(String::new()),
            ..Default::default()
        });

        // Everything else untouched, env var explicitly cleared.
        assert_eq!(preset.name, "n");
        assert_eq!(preset.provider, "openai");
        assert_eq!(preset.model, "gpt-4");
        assert_eq!(preset.api_key_env_var, "");
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let raw = serde_json::json!({
            "id": "cfg-1-abcdef",
            "name": "work",
            "provider": "openai",
            "model": "gpt-4",
            "apiKeyEnvVar": "OPENAI_API_KEY",
            "customNote": "keep me",
        });
        let mut preset: Preset = serde_json::from_value(raw).unwrap();
        preset.apply(&PresetUpdate {
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        });

        let out = serde_json::to_value(&preset).unwrap();
        assert_eq!(out["model"], "gpt-4o");
        assert_eq!(out["customNote"], "keep me");
    }

    #[test]
    fn test_apply_overwrites_non_empty_fields() {
        let mut preset = sample();
        preset.apply(&PresetUpdate {
            name: Some("renamed".to_string()),
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        });

        assert_eq!(preset.name, "renamed");
        assert_eq!(preset.model, "gpt-4o");
        assert_eq!(preset.provider, "openai");
    }
}
