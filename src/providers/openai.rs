// OpenAI-compatible chat completion provider
//
// Works for OpenAI itself and for every service that speaks the same
// `/v1/chat/completions` format (Grok, Mistral, Groq, Ollama).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::{with_retry, ProviderStatusError, RetryPolicy};
use super::types::{Completion, Message, ProviderRequest};
use super::LlmProvider;
use crate::config::constants::DEFAULT_MAX_TOKENS;

const REQUEST_TIMEOUT_SECS: u64 = 180;

/// OpenAI API provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    provider_name: String,
    max_tokens: u32,
    temperature: Option<f32>,
    retry: RetryPolicy,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new_openai(api_key: String) -> Result<Self> {
        Self::new(
            api_key,
            "https://api.openai.com".to_string(),
            "gpt-4o".to_string(),
            "openai".to_string(),
        )
    }

    /// Create a new Grok provider (uses OpenAI-compatible API)
    pub fn new_grok(api_key: String) -> Result<Self> {
        Self::new(
            api_key,
            "https://api.x.ai".to_string(),
            "grok-2".to_string(),
            "grok".to_string(),
        )
    }

    /// Create a new Mistral provider (uses OpenAI-compatible API)
    pub fn new_mistral(api_key: String) -> Result<Self> {
        Self::new(
            api_key,
            "https://api.mistral.ai".to_string(),
            "mistral-large-latest".to_string(),
            "mistral".to_string(),
        )
    }

    /// Create a new Groq provider (fast inference, uses OpenAI-compatible API)
    /// Note: This is Groq (by Groq Inc), not Grok (by X.AI)
    pub fn new_groq(api_key: String) -> Result<Self> {
        Self::new(
            api_key,
            "https://api.groq.com/openai".to_string(),
            "llama-3.1-70b-versatile".to_string(),
            "groq".to_string(),
        )
    }

    /// Create a provider for a local Ollama server (no API key)
    pub fn new_ollama(base_url: Option<String>, model: String) -> Result<Self> {
        Self::new(
            String::new(),
            base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model,
            "ollama".to_string(),
        )
    }

    /// Set custom model for this provider
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Point the provider at a different endpoint (proxy, self-hosted gateway)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn new(
        api_key: String,
        base_url: String,
        default_model: String,
        provider_name: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url,
            default_model,
            provider_name,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            retry: RetryPolicy::default(),
        })
    }

    /// Convert ProviderRequest to OpenAI API format
    fn to_openai_request<'a>(&self, request: &'a ProviderRequest) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages: &request.messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.or(self.temperature),
        }
    }

    /// Send a single request (no retry)
    async fn complete_once(&self, request: &ProviderRequest) -> Result<Completion> {
        let body = self.to_openai_request(request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(
            "Sending {} message(s) to {} ({})",
            body.messages.len(),
            self.provider_name,
            body.model
        );

        let mut builder = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {} API", self.provider_name))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderStatusError {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
                body: error_body,
            }
            .into());
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} API response", self.provider_name))?;

        let usage = parsed.usage.unwrap_or_default();
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .with_context(|| format!("{} returned no choices in response", self.provider_name))?;

        tracing::debug!(
            "Received completion (finish_reason: {:?}, prompt_tokens: {}, completion_tokens: {})",
            choice.finish_reason,
            usage.prompt_tokens,
            usage.completion_tokens
        );

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn complete(&self, request: &ProviderRequest) -> Result<Completion> {
        with_retry(self.retry, || self.complete_once(request)).await
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: String,
    messages: &'a [Message],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity() {
        let provider = OpenAIProvider::new_openai("sk-test".to_string())
            .unwrap()
            .with_model("gpt-4o-mini");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_request_falls_back_to_provider_defaults() {
        let provider = OpenAIProvider::new_openai("sk-test".to_string())
            .unwrap()
            .with_max_tokens(512)
            .with_temperature(0.0);
        let request = ProviderRequest::user("hi");
        let body = provider.to_openai_request(&request);
        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.max_tokens, 512);
        assert_eq!(body.temperature, Some(0.0));
    }

    #[test]
    fn test_request_overrides_win() {
        let provider = OpenAIProvider::new_groq("gsk-test".to_string())
            .unwrap()
            .with_temperature(0.7);
        let request = ProviderRequest {
            model: Some("llama-3.3-70b".to_string()),
            max_tokens: Some(64),
            temperature: Some(0.0),
            ..ProviderRequest::user("hi")
        };
        let body = provider.to_openai_request(&request);
        assert_eq!(body.model, "llama-3.3-70b");
        assert_eq!(body.max_tokens, 64);
        assert_eq!(body.temperature, Some(0.0));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = OpenAIProvider::new_openai("sk-test".to_string())
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(provider.base_url, "http://localhost:8080");
    }
}
