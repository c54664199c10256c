// Request/response types for the generative text service boundary

use serde::{Deserialize, Serialize};

/// One role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider-agnostic completion request.
///
/// Unset fields fall back to the provider's configured defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderRequest {
    /// Ordered conversation messages
    pub messages: Vec<Message>,

    /// Model name override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderRequest {
    /// Create a new request from messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Single user-message request, the shape every pipeline stage sends.
    pub fn user(prompt: impl Into<String>) -> Self {
        Self::new(vec![Message::user(prompt)])
    }
}

/// Response text plus the token counts reported for the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Completion {
    pub fn new(text: impl Into<String>, prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            text: text.into(),
            prompt_tokens,
            completion_tokens,
        }
    }
}
