//! Configuration loading, validation, and management for ironcoach.
//!
//! Loads configuration from `~/.ironcoach/config.toml` with environment
//! variable overrides. Validates all settings at startup. API keys live in a
//! separate secrets file (see [`secrets`]) or in the environment.

pub mod secrets;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use secrets::{SecretStore, resolve_api_key};

/// The root configuration structure.
///
/// Maps directly to `~/.ironcoach/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model service backend ("gemini", "openai", "openrouter", "ollama", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum tool-calling rounds per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// How many recent workout rows go into the standing instruction
    #[serde(default = "default_recent_log_limit")]
    pub recent_log_limit: usize,

    /// Database and knowledge locations
    #[serde(default)]
    pub data: DataConfig,

    /// Secrets file location
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Provider-specific overrides
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Providers with a built-in base URL. Any other name needs
/// `providers.<name>.api_url`.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "gemini",
    "google",
    "openai",
    "openrouter",
    "ollama",
    "deepseek",
    "groq",
    "vllm",
    "llamacpp",
    "llama.cpp",
];

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-flash-latest".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tool_rounds() -> u32 {
    8
}
fn default_recent_log_limit() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: PathBuf,
}

fn default_database_path() -> PathBuf {
    AppConfig::config_dir().join("training.db")
}
fn default_knowledge_dir() -> PathBuf {
    AppConfig::config_dir().join("knowledge")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            knowledge_dir: default_knowledge_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default = "default_secrets_path")]
    pub path: PathBuf,
}

fn default_secrets_path() -> PathBuf {
    AppConfig::config_dir().join("secrets.toml")
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            path: default_secrets_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Name of the secret/env variable holding this provider's key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_name: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.ironcoach/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `IRONCOACH_PROVIDER`
    /// - `IRONCOACH_MODEL`
    /// - `IRONCOACH_DB`
    /// - `IRONCOACH_KNOWLEDGE_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = env("IRONCOACH_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = env("IRONCOACH_MODEL") {
            self.model = model;
        }
        if let Some(db) = env("IRONCOACH_DB") {
            self.data.database_path = PathBuf::from(db);
        }
        if let Some(dir) = env("IRONCOACH_KNOWLEDGE_DIR") {
            self.data.knowledge_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ironcoach")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_rounds must be at least 1".into(),
            ));
        }

        if self.recent_log_limit == 0 {
            return Err(ConfigError::ValidationError(
                "recent_log_limit must be at least 1".into(),
            ));
        }

        if self.provider_url().is_none() && !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown provider '{}': set providers.{}.api_url",
                self.provider, self.provider
            )));
        }

        Ok(())
    }

    /// The configured base URL override for the active provider.
    pub fn provider_url(&self) -> Option<&str> {
        self.providers
            .get(&self.provider)
            .and_then(|p| p.api_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// The secret/env name holding the active provider's key.
    pub fn api_key_name(&self) -> String {
        self.providers
            .get(&self.provider)
            .and_then(|p| p.api_key_name.clone())
            .unwrap_or_else(|| default_key_name(&self.provider).into())
    }

    /// Resolve the active provider's API key: secrets file, then environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        let secrets = SecretStore::load(&self.secrets.path);
        resolve_api_key(&secrets, &self.api_key_name(), |name| std::env::var(name).ok())
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            max_tool_rounds: default_max_tool_rounds(),
            recent_log_limit: default_recent_log_limit(),
            data: DataConfig::default(),
            secrets: SecretsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Well-known key names per provider.
fn default_key_name(provider: &str) -> &'static str {
    match provider {
        "gemini" | "google" => "GOOGLE_API_KEY",
        "openai" => "OPENAI_API_KEY",
        "openrouter" => "OPENROUTER_API_KEY",
        _ => "IRONCOACH_API_KEY",
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.max_tool_rounds, 8);
        assert_eq!(config.recent_log_limit, 5);
        assert!(config.validate().is_ok());
        assert!(config.data.database_path.ends_with("training.db"));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.data.knowledge_dir, config.data.knowledge_dir);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_round_cap_rejected() {
        let config = AppConfig {
            max_tool_rounds: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn unknown_provider_needs_an_api_url() {
        let mut config = AppConfig {
            provider: "mystery".into(),
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("providers.mystery.api_url"));

        config.providers.insert(
            "mystery".into(),
            ProviderConfig {
                api_url: Some("http://10.0.0.5:9000/v1".into()),
                api_key_name: None,
            },
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.provider_url(), Some("http://10.0.0.5:9000/v1"));
    }

    #[test]
    fn unknown_provider_in_file_is_rejected_at_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "provider = \"mystery\"\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gemini-2.5-pro"
max_tool_rounds = 3

[data]
database_path = "/var/lib/ironcoach/log.db"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.data.database_path, PathBuf::from("/var/lib/ironcoach/log.db"));
        assert!(config.data.knowledge_dir.ends_with("knowledge"));
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            "IRONCOACH_MODEL" => Some("gemini-2.5-flash".into()),
            "IRONCOACH_DB" => Some("/tmp/t.db".into()),
            _ => None,
        });
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.data.database_path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn key_name_follows_provider() {
        let mut config = AppConfig::default();
        assert_eq!(config.api_key_name(), "GOOGLE_API_KEY");

        config.provider = "openrouter".into();
        assert_eq!(config.api_key_name(), "OPENROUTER_API_KEY");

        config.providers.insert(
            "openrouter".into(),
            ProviderConfig {
                api_url: None,
                api_key_name: Some("MY_ROUTER_KEY".into()),
            },
        );
        assert_eq!(config.api_key_name(), "MY_ROUTER_KEY");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-flash-latest"));
        assert!(toml_str.contains("max_tool_rounds"));
    }
}
