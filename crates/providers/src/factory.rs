//! Provider factory — builds the configured completion provider.

use std::sync::Arc;
use std::time::Duration;

use chatrelay_config::CompletionConfig;
use chatrelay_core::error::ProviderError;
use chatrelay_core::provider::Provider;
use tracing::warn;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider described by `config`.
///
/// A missing API key is not an error here; the first completion call
/// fails with `AuthenticationFailed` instead, so `ask`/`doctor` can still
/// start.
pub fn build_from_config(config: &CompletionConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().unwrap_or_default();
    if api_key.is_empty() && config.provider != "ollama" {
        warn!(provider = %config.provider, "No completion API key configured");
    }

    let base_url = match &config.api_url {
        Some(url) => url.clone(),
        None => default_base_url(&config.provider).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{}' needs completion.api_url",
                config.provider
            ))
        })?,
    };

    let timeout = Duration::from_secs(config.timeout_secs);
    let provider = OpenAiCompatProvider::new(&config.provider, base_url, api_key, timeout)?;
    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        _ => return None,
    };
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").unwrap().contains("openrouter.ai"));
        assert!(default_base_url("openai").unwrap().contains("api.openai.com"));
        assert!(default_base_url("ollama").unwrap().contains("localhost:11434"));
        assert!(default_base_url("custom").is_none());
    }

    #[test]
    fn build_from_default_config() {
        let provider = build_from_config(&CompletionConfig::default()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn unknown_provider_without_url_is_rejected() {
        let config = CompletionConfig {
            provider: "mystery".into(),
            ..CompletionConfig::default()
        };
        assert!(matches!(
            build_from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn explicit_url_wins() {
        let config = CompletionConfig {
            provider: "custom".into(),
            api_url: Some("http://127.0.0.1:9999/v1".into()),
            ..CompletionConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "custom");
    }
}
