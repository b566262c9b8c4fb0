//! Provider selection from configuration.

use std::sync::Arc;

use ironcoach_config::{AppConfig, ConfigError};
use ironcoach_core::provider::Provider;
use tracing::debug;

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider. `api_key` is the credential resolved
/// once at startup; `None` yields a provider that reports a missing key
/// on every call. An unknown provider without an `api_url` is rejected
/// here rather than failing mid-turn.
pub fn build_from_config(
    config: &AppConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn Provider>, ConfigError> {
    let name = config.provider.as_str();
    let custom_url = config.provider_url().map(str::to_string);
    let key_name = config.api_key_name();

    debug!(provider = name, has_key = api_key.is_some(), "Building provider");

    match name {
        "gemini" | "google" => {
            let mut provider = GeminiProvider::new(api_key).with_key_name(key_name);
            if let Some(url) = custom_url {
                provider = provider.with_base_url(url);
            }
            Ok(Arc::new(provider))
        }
        _ => {
            let base_url = custom_url.or_else(|| default_base_url(name)).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "unknown provider '{name}': set providers.{name}.api_url"
                ))
            })?;
            let api_key = if is_local(name) {
                api_key.or_else(|| Some(name.to_string()))
            } else {
                api_key
            };
            Ok(Arc::new(
                OpenAiCompatProvider::new(name, base_url, api_key).with_key_name(key_name),
            ))
        }
    }
}

/// Local servers accept any bearer token.
fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<String> {
    match provider_name {
        "gemini" | "google" => Some(crate::gemini::DEFAULT_BASE_URL),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
    .map(str::to_string)
}
