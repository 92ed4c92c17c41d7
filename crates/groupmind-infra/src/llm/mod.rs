//! LLM provider implementations.
//!
//! Provides the OpenAI-compatible chat client and a factory
//! ([`create_provider`]) that builds it from an [`LlmConfig`].

pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use groupmind_core::llm::box_provider::BoxLlmProvider;
use groupmind_types::config::LlmConfig;
use groupmind_types::llm::LlmError;

use self::openai_compat::{OpenAiCompatConfig, OpenAiCompatProvider};

/// Create a [`BoxLlmProvider`] from the `[llm]` config section.
///
/// The provider is named after the endpoint host so spans can tell local
/// and hosted models apart.
pub fn create_provider(config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
    let provider = OpenAiCompatProvider::new(OpenAiCompatConfig {
        provider_name: provider_name(&config.base_url),
        base_url: config.base_url.clone(),
        api_key: config
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::from(k.clone())),
        model: config.model.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
    })?;
    Ok(BoxLlmProvider::new(provider))
}

fn provider_name(base_url: &str) -> String {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    match host {
        "localhost" | "127.0.0.1" => "ollama".to_string(),
        "" => "openai-compatible".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_from_defaults() {
        let provider = create_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_provider_name_uses_host() {
        assert_eq!(provider_name("https://openrouter.ai/api/v1"), "openrouter.ai");
        assert_eq!(provider_name("http://127.0.0.1:8000/v1"), "ollama");
        assert_eq!(provider_name(""), "openai-compatible");
    }
}
