// Provider factory
//
// Creates LLM providers from the `[provider]` configuration entry

use anyhow::Result;
use std::sync::Arc;

use super::openai::OpenAIProvider;
use super::LlmProvider;
use crate::config::{ProviderEntry, SamplingSettings};

/// Create an `LlmProvider` from a `ProviderEntry` and the `[sampling]` settings.
pub fn create_provider(
    entry: &ProviderEntry,
    sampling: &SamplingSettings,
) -> Result<Arc<dyn LlmProvider>> {
    let mut provider = match entry {
        ProviderEntry::Openai {
            api_key, base_url, ..
        } => {
            let mut provider = OpenAIProvider::new_openai(api_key.clone())?;
            if let Some(url) = base_url {
                provider = provider.with_base_url(url.clone());
            }
            provider
        }
        ProviderEntry::Grok { api_key, .. } => OpenAIProvider::new_grok(api_key.clone())?,
        ProviderEntry::Mistral { api_key, .. } => OpenAIProvider::new_mistral(api_key.clone())?,
        ProviderEntry::Groq { api_key, .. } => OpenAIProvider::new_groq(api_key.clone())?,
        ProviderEntry::Ollama { base_url, model, .. } => {
            OpenAIProvider::new_ollama(base_url.clone(), model.clone())?
        }
    };

    if let Some(model) = entry.model() {
        provider = provider.with_model(model);
    }
    if let Some(max_tokens) = sampling.max_tokens {
        provider = provider.with_max_tokens(max_tokens);
    }
    if let Some(temperature) = sampling.temperature {
        provider = provider.with_temperature(temperature);
    }

    tracing::debug!(
        "Created provider '{}' (model: {})",
        entry.display_name(),
        provider.default_model()
    );

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_with_model_override() {
        let entry = ProviderEntry::Openai {
            api_key: "sk-test".to_string(),
            model: Some("gpt-4o-mini".to_string()),
            base_url: None,
            name: None,
        };
        let provider = create_provider(&entry, &SamplingSettings::default()).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_create_ollama_uses_entry_model() {
        let entry = ProviderEntry::Ollama {
            model: "qwen2.5-coder".to_string(),
            base_url: None,
            name: None,
        };
        let provider = create_provider(&entry, &SamplingSettings::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.default_model(), "qwen2.5-coder");
    }
}
