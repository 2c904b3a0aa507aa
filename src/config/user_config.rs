//! User-level configuration for trustcard
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/trustcard/config.toml

use crate::ai::{AiClient, AiConfig, LlmBackend};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: UserAiConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserAiConfig {
    /// AI backend: "genai" (default), "openai", "anthropic", "ollama"
    pub backend: Option<String>,

    /// Model override for the selected backend
    pub model: Option<String>,

    /// Endpoint override for the selected backend
    pub api_url: Option<String>,

    pub genai_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct GithubConfig {
    pub token: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct HuggingFaceConfig {
    pub token: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/trustcard/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Get the user config directory path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("trustcard").join("config.toml"))
    }

    /// Environment variables override everything
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = var("GENAI_API_KEY") {
            self.ai.genai_api_key = Some(key);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(key);
        }
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.ai.anthropic_api_key = Some(key);
        }
        if let Some(token) = var("GH_TOKEN").or_else(|| var("GITHUB_TOKEN")) {
            self.github.token = Some(token);
        }
        if let Some(token) = var("HF_TOKEN") {
            self.huggingface.token = Some(token);
        }
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.ai.backend, other.ai.backend);
        take(&mut self.ai.model, other.ai.model);
        take(&mut self.ai.api_url, other.ai.api_url);
        take(&mut self.ai.genai_api_key, other.ai.genai_api_key);
        take(&mut self.ai.openai_api_key, other.ai.openai_api_key);
        take(&mut self.ai.anthropic_api_key, other.ai.anthropic_api_key);
        take(&mut self.github.token, other.github.token);
        take(&mut self.huggingface.token, other.huggingface.token);
    }

    /// Configured backend; unknown names fall back to the default
    pub fn ai_backend(&self) -> LlmBackend {
        match self.ai.backend.as_deref() {
            None => LlmBackend::default(),
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!("{}; using {:?}", e, LlmBackend::default());
                LlmBackend::default()
            }),
        }
    }

    fn api_key_for(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::GenAi => self.ai.genai_api_key.as_deref(),
            LlmBackend::OpenAi => self.ai.openai_api_key.as_deref(),
            LlmBackend::Anthropic => self.ai.anthropic_api_key.as_deref(),
            LlmBackend::Ollama => Some("ollama"),
        }
    }

    /// Check if AI features are available
    pub fn has_ai_key(&self) -> bool {
        self.api_key_for(self.ai_backend()).is_some()
    }

    /// Client for the configured backend, `None` without a key
    pub fn ai_client(&self) -> Option<AiClient> {
        let backend = self.ai_backend();
        let key = self.api_key_for(backend)?;
        let config = AiConfig {
            backend,
            model: self.ai.model.clone(),
            api_url: self.ai.api_url.clone(),
            ..Default::default()
        };
        Some(AiClient::new(config, key))
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    pub fn huggingface_token(&self) -> Option<&str> {
        self.huggingface.token.as_deref()
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# trustcard user configuration

[ai]
# Backend: "genai" (default), "openai", "anthropic" or "ollama" (local, no key)
# backend = "genai"
# model = "llama3.3:70b"
# genai_api_key = "sk-..."
# openai_api_key = "sk-..."
# anthropic_api_key = "sk-ant-..."

[github]
# Used to clone private repositories (GH_TOKEN overrides)
# token = "ghp_..."

[huggingface]
# token = "hf_..."
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert!(!config.has_ai_key());
        assert_eq!(config.ai_backend(), LlmBackend::GenAi);
        assert!(config.ai_client().is_none());
        assert!(config.github_token().is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[ai]
backend = "anthropic"
anthropic_api_key = "sk-ant-abc"

[github]
token = "ghp_123"
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ai_backend(), LlmBackend::Anthropic);
        assert!(config.has_ai_key());
        assert_eq!(config.github_token(), Some("ghp_123"));
        let client = config.ai_client().unwrap();
        assert_eq!(client.backend(), LlmBackend::Anthropic);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config: UserConfig = toml::from_str("[ai]\nbackend = \"ollama\"\n").unwrap();
        assert!(config.has_ai_key());
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config: UserConfig = toml::from_str("[ai]\nbackend = \"bard\"\n").unwrap();
        assert_eq!(config.ai_backend(), LlmBackend::GenAi);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: UserConfig =
            toml::from_str("[ai]\ngenai_api_key = \"from-file\"\n[github]\ntoken = \"file\"\n")
                .unwrap();
        let env: HashMap<&str, &str> = [("GENAI_API_KEY", "from-env"), ("GH_TOKEN", "  ")]
            .into_iter()
            .collect();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.ai.genai_api_key.as_deref(), Some("from-env"));
        // Blank variables are ignored
        assert_eq!(config.github_token(), Some("file"));
    }

    #[test]
    fn test_merge_preserves_base_when_other_is_none() {
        let mut base = UserConfig {
            ai: UserAiConfig {
                openai_api_key: Some("sk-original".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        base.merge(UserConfig::default());
        assert_eq!(base.ai.openai_api_key.as_deref(), Some("sk-original"));
    }

    #[test]
    fn test_invalid_toml_does_not_parse() {
        assert!(toml::from_str::<UserConfig>("this is [[ not valid").is_err());
    }

    #[test]
    fn test_user_config_path() {
        if let Some(p) = UserConfig::user_config_path() {
            assert!(p.ends_with("trustcard/config.toml"));
        }
    }
}
