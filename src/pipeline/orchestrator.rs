// Orchestrator: retrieval, planning, then synthesis and repair per ranked plan

use anyhow::Result;
use std::sync::Arc;

use super::planner::PlanningEngine;
use super::repair::{RepairLoop, RepairOutcome};
use super::retriever::ExemplarRetriever;
use super::synthesizer::CodeSynthesizer;
use super::types::{RunContext, SolveOutcome};
use crate::config::PipelineConfig;
use crate::dataset::{Dataset, ProblemItem};
use crate::errors::PipelineError;
use crate::evaluation::Evaluator;
use crate::providers::LlmProvider;

/// Solves one problem at a time. Every model call and evaluation is awaited
/// before the next one starts.
pub struct Orchestrator {
    retriever: ExemplarRetriever,
    planner: PlanningEngine,
    synthesizer: CodeSynthesizer,
    repair_loop: RepairLoop,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dataset: Arc<dyn Dataset>,
        evaluator: Arc<dyn Evaluator>,
        config: &PipelineConfig,
    ) -> Self {
        let language = config.language.as_str();
        Self {
            retriever: ExemplarRetriever::new(
                Arc::clone(&provider),
                Arc::clone(&dataset),
                config.k,
                language,
            ),
            planner: PlanningEngine::new(Arc::clone(&provider), Arc::clone(&dataset), language),
            synthesizer: CodeSynthesizer::new(
                Arc::clone(&provider),
                Arc::clone(&dataset),
                language,
            ),
            repair_loop: RepairLoop::new(provider, dataset, evaluator, language, config.t),
        }
    }

    /// Run the full pipeline for `item` with a fresh [`RunContext`].
    ///
    /// Returns the first passing candidate in plan-rank order. When every
    /// plan exhausts its repair budget, returns the last candidate attempted
    /// (the final repair of the lowest-ranked plan) with `passed = false`.
    pub async fn solve(&self, item: &ProblemItem) -> Result<SolveOutcome> {
        let mut ctx = RunContext::new();
        tracing::info!("Solving '{}'", item.id);

        let retrieval = self.retriever.retrieve(item, &mut ctx).await?;
        let plannings = self.planner.plan(item, &retrieval, &mut ctx).await?;

        let mut last: Option<RepairOutcome> = None;
        for (rank, planning) in plannings.iter().enumerate() {
            tracing::info!(
                "Trying plan {} of {} for '{}' (confidence {})",
                rank + 1,
                plannings.len(),
                item.id,
                planning.confidence
            );

            let candidate = self
                .synthesizer
                .synthesize(item, planning, rank, &retrieval.algorithm, &mut ctx)
                .await?;
            let outcome = self
                .repair_loop
                .run(item, &retrieval.algorithm, candidate, &mut ctx)
                .await?;

            if outcome.passed() {
                return Ok(SolveOutcome::new(
                    outcome.candidate,
                    true,
                    outcome.report,
                    rank + 1,
                    &ctx,
                ));
            }
            last = Some(outcome);
        }

        // Retrieval guarantees at least one exemplar, hence one plan.
        let outcome = last.ok_or_else(|| PipelineError::NoExemplars {
            problem_id: item.id.clone(),
        })?;
        tracing::info!("No plan passed for '{}'", item.id);

        Ok(SolveOutcome::new(
            outcome.candidate,
            false,
            outcome.report,
            plannings.len(),
            &ctx,
        ))
    }
}
