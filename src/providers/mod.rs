// Generative text service boundary
//
// The pipeline only ever sees `LlmProvider`: an ordered list of role-tagged
// messages goes in, response text plus token counts come out. Retry and rate
// limiting live behind this trait, never in the pipeline.

use anyhow::Result;
use async_trait::async_trait;

pub mod factory;
pub mod openai;
pub mod retry;
pub mod types;

pub use factory::create_provider;
pub use openai::OpenAIProvider;
pub use retry::{with_retry, ProviderStatusError, RetryPolicy};
pub use types::{Completion, Message, ProviderRequest};

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the complete response
    async fn complete(&self, request: &ProviderRequest) -> Result<Completion>;

    /// Get the provider name (e.g., "openai", "groq")
    fn name(&self) -> &str;

    /// Get the default model for this provider
    fn default_model(&self) -> &str;
}
