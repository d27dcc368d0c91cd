use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::provider::Provider;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Overrides every provider-specific key variable when set.
pub const API_KEY_ENV: &str = "DIFFNOSIS_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Everything the completion client needs, with defaults filled in.
#[derive(Clone, PartialEq)]
pub struct RelaySettings {
    pub provider: Provider,
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySettings")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::default().as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// `<config_dir>/diffnosis`, also used for the log file
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("diffnosis"))
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<RelaySettings> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Fill in defaults and find the API key. The key is looked up in
    /// `DIFFNOSIS_API_KEY`, then the provider's own variable, then the file.
    pub fn resolve_with<F>(&self, env: F) -> Result<RelaySettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match self.provider.as_deref() {
            Some(name) => Provider::from_str(name)
                .ok_or_else(|| anyhow!("Unknown provider '{}' (expected groq or openai)", name))?,
            None => Provider::default(),
        };

        let api_key = env(API_KEY_ENV)
            .or_else(|| env(provider.api_key_env()))
            .or_else(|| self.api_key.clone())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured. Set {} (or {}) or add \"api_key\" to {}",
                    provider.api_key_env(),
                    API_KEY_ENV,
                    Self::get_config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "config.json".to_string())
                )
            })?;

        Ok(RelaySettings {
            provider,
            endpoint: self.endpoint.clone().unwrap_or_else(|| provider.endpoint().to_string()),
            api_key,
            model: self.model.clone().unwrap_or_else(|| provider.default_model().to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            provider: Some("openai".into()),
            model: Some("gpt-4o".into()),
            max_tokens: Some(250),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_resolve_defaults_for_groq() {
        let settings = Config::new()
            .resolve_with(env_of(&[("GROQ_API_KEY", "gsk-test")]))
            .unwrap();

        assert_eq!(settings.provider, Provider::Groq);
        assert_eq!(settings.endpoint, "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(settings.model, "llama-3.2-11b-vision-preview");
        assert_eq!(settings.api_key, "gsk-test");
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 100);
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_key_precedence() {
        let config = Config {
            api_key: Some("from-file".into()),
            ..Config::new()
        };

        let key = |pairs: &[(&str, &str)]| config.resolve_with(env_of(pairs)).unwrap().api_key;
        assert_eq!(key(&[]), "from-file");
        assert_eq!(key(&[("GROQ_API_KEY", "from-provider")]), "from-provider");
        assert_eq!(
            key(&[("GROQ_API_KEY", "from-provider"), (API_KEY_ENV, "from-override")]),
            "from-override"
        );
    }

    #[test]
    fn test_resolve_without_key_fails() {
        let err = Config::new().resolve_with(env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_resolve_unknown_provider_fails() {
        let config = Config {
            provider: Some("ollama".into()),
            ..Config::default()
        };
        assert!(config.resolve_with(env_of(&[(API_KEY_ENV, "k")])).is_err());
    }

    #[test]
    fn test_settings_debug_hides_key() {
        let settings = Config::new()
            .resolve_with(env_of(&[(API_KEY_ENV, "super-secret")]))
            .unwrap();
        assert!(!format!("{:?}", settings).contains("super-secret"));
    }
}
