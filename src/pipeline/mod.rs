// Solve pipeline
//
// Exemplar retrieval, plan generation and verification, code synthesis, and
// the bounded test-and-repair loop, driven per problem by the Orchestrator.

use anyhow::{Context, Result};

pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod repair;
pub mod retriever;
pub mod synthesizer;
pub mod types;

pub use orchestrator::Orchestrator;
pub use planner::{parse_confidence, PlanningEngine};
pub use repair::{RepairLoop, RepairOutcome, RepairState};
pub use retriever::{parse_retrieval, ExemplarRetriever};
pub use synthesizer::CodeSynthesizer;
pub use types::{
    rank_plannings, CodeCandidate, Exemplar, Planning, Retrieval, RunContext, SolveOutcome,
    UsageCounters,
};

use crate::providers::{LlmProvider, ProviderRequest};

/// Send a single-message prompt and account for it in `ctx`.
pub(crate) async fn request_completion(
    provider: &dyn LlmProvider,
    prompt: String,
    ctx: &mut RunContext,
) -> Result<String> {
    tracing::debug!("Prompt #{} ({} chars)", ctx.api_calls() + 1, prompt.len());

    let completion = provider
        .complete(&ProviderRequest::user(prompt))
        .await
        .with_context(|| format!("Model call via {} failed", provider.name()))?;
    ctx.record_call(&completion);

    tracing::debug!(
        "Response #{}: {} chars, {} prompt / {} completion tokens",
        ctx.api_calls(),
        completion.text.len(),
        completion.prompt_tokens,
        completion.completion_tokens
    );
    Ok(completion.text)
}
