// Provider entry: which OpenAI-compatible service answers the prompts.

use serde::{Deserialize, Serialize};

/// A single provider entry.
///
/// Serializes with a `type` tag, e.g.:
/// ```toml
/// [provider]
/// type = "openai"
/// api_key = "sk-..."
/// model = "gpt-4o-mini"
///
/// [provider]
/// type = "ollama"
/// model = "qwen2.5-coder:14b"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderEntry {
    Openai {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Grok {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Mistral {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Groq {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Ollama {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ProviderEntry {
    /// Human-readable name for logs.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Openai { name, .. } => name.as_deref().unwrap_or("OpenAI"),
            Self::Grok { name, .. } => name.as_deref().unwrap_or("Grok"),
            Self::Mistral { name, .. } => name.as_deref().unwrap_or("Mistral"),
            Self::Groq { name, .. } => name.as_deref().unwrap_or("Groq"),
            Self::Ollama { name, .. } => name.as_deref().unwrap_or("Ollama"),
        }
    }

    /// The `type` tag value.
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Openai { .. } => "openai",
            Self::Grok { .. } => "grok",
            Self::Mistral { .. } => "mistral",
            Self::Groq { .. } => "groq",
            Self::Ollama { .. } => "ollama",
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Openai { model, .. }
            | Self::Grok { model, .. }
            | Self::Mistral { model, .. }
            | Self::Groq { model, .. } => model.as_deref(),
            Self::Ollama { model, .. } => Some(model),
        }
    }

    /// API key, if this provider needs one.
    pub fn api_key(&self) -> Option<&str> {
        match self {
            Self::Openai { api_key, .. }
            | Self::Grok { api_key, .. }
            | Self::Mistral { api_key, .. }
            | Self::Groq { api_key, .. } => Some(api_key),
            Self::Ollama { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_entry() {
        let entry: ProviderEntry = toml::from_str(
            r#"
            type = "groq"
            api_key = "gsk-abc"
            "#,
        )
        .unwrap();
        assert_eq!(entry.provider_type(), "groq");
        assert_eq!(entry.api_key(), Some("gsk-abc"));
        assert_eq!(entry.model(), None);
        assert_eq!(entry.display_name(), "Groq");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let entry: ProviderEntry = toml::from_str(
            r#"
            type = "ollama"
            model = "qwen2.5-coder"
            name = "Local coder"
            "#,
        )
        .unwrap();
        assert_eq!(entry.api_key(), None);
        assert_eq!(entry.model(), Some("qwen2.5-coder"));
        assert_eq!(entry.display_name(), "Local coder");
    }
}
