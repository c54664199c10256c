// CodeSynthesizer: a ranked plan becomes the initial code candidate

use anyhow::Result;
use std::sync::Arc;

use super::prompts::{algorithm_section, code_prompt, samples_section};
use super::request_completion;
use super::types::{CodeCandidate, Planning, RunContext};
use crate::dataset::{render_samples, Dataset, ProblemItem};
use crate::parsing::extract_code;
use crate::providers::LlmProvider;

pub struct CodeSynthesizer {
    provider: Arc<dyn LlmProvider>,
    dataset: Arc<dyn Dataset>,
    language: String,
}

impl CodeSynthesizer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dataset: Arc<dyn Dataset>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            dataset,
            language: language.into(),
        }
    }

    /// One model call; the last fenced block of the answer is the candidate.
    pub async fn synthesize(
        &self,
        item: &ProblemItem,
        planning: &Planning,
        plan_rank: usize,
        algorithm: &str,
        ctx: &mut RunContext,
    ) -> Result<CodeCandidate> {
        let prompt = code_prompt(
            &self.dataset.get_prompt(item),
            &planning.plan,
            &algorithm_section(algorithm),
            &samples_section(&render_samples(&item.sample_tests)),
            &self.language,
            self.dataset.requires_std_io(),
        );
        let response = request_completion(self.provider.as_ref(), prompt, ctx).await?;

        Ok(CodeCandidate {
            code: extract_code(&response),
            plan: planning.plan.clone(),
            plan_rank,
            attempt: 0,
        })
    }
}
