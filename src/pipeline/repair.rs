// RepairLoop: test a candidate, and on failure ask for a revision, at most
// `t` times per plan

use anyhow::{Context, Result};
use std::sync::Arc;

use super::prompts::{algorithm_section, repair_prompt};
use super::request_completion;
use super::types::{CodeCandidate, RunContext};
use crate::dataset::{Dataset, ProblemItem};
use crate::evaluation::{Evaluator, TestReport};
use crate::parsing::extract_code;
use crate::providers::LlmProvider;

/// States a candidate moves through while it is tested and repaired.
///
/// `Generated -> Testing -> Pass`, or
/// `Testing -> NeedsRepair -> Repairing -> Testing` until the repair budget
/// runs out, then `Exhausted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairState {
    Generated(CodeCandidate),
    Testing(CodeCandidate),
    NeedsRepair {
        candidate: CodeCandidate,
        report: TestReport,
    },
    Repairing {
        candidate: CodeCandidate,
        report: TestReport,
    },
    Pass {
        candidate: CodeCandidate,
        report: TestReport,
    },
    Exhausted {
        candidate: CodeCandidate,
        report: TestReport,
    },
}

/// Terminal result of one repair loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub candidate: CodeCandidate,
    pub report: TestReport,
}

impl RepairOutcome {
    pub fn passed(&self) -> bool {
        self.report.passed
    }
}

pub struct RepairLoop {
    provider: Arc<dyn LlmProvider>,
    dataset: Arc<dyn Dataset>,
    evaluator: Arc<dyn Evaluator>,
    language: String,
    max_repairs: usize,
}

impl RepairLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dataset: Arc<dyn Dataset>,
        evaluator: Arc<dyn Evaluator>,
        language: impl Into<String>,
        max_repairs: usize,
    ) -> Self {
        Self {
            provider,
            dataset,
            evaluator,
            language: language.into(),
            max_repairs,
        }
    }

    /// Drive `initial` to `Pass` or `Exhausted`.
    ///
    /// Evaluates at most `max_repairs + 1` times and issues at most
    /// `max_repairs` repair calls. A pass stops the loop immediately.
    pub async fn run(
        &self,
        item: &ProblemItem,
        algorithm: &str,
        initial: CodeCandidate,
        ctx: &mut RunContext,
    ) -> Result<RepairOutcome> {
        let mut state = RepairState::Generated(initial);

        loop {
            state = match state {
                RepairState::Generated(candidate) => RepairState::Testing(candidate),

                RepairState::Testing(candidate) => {
                    let report = self
                        .evaluator
                        .evaluate(item, &candidate.code, &self.language)
                        .await
                        .with_context(|| format!("Failed to evaluate candidate for '{}'", item.id))?;
                    ctx.record_evaluation();

                    if report.passed {
                        RepairState::Pass { candidate, report }
                    } else if candidate.attempt >= self.max_repairs {
                        RepairState::Exhausted { candidate, report }
                    } else {
                        RepairState::NeedsRepair { candidate, report }
                    }
                }

                RepairState::NeedsRepair { candidate, report } => {
                    tracing::info!(
                        "Candidate for '{}' failed (plan {}, attempt {}), repairing",
                        item.id,
                        candidate.plan_rank,
                        candidate.attempt
                    );
                    RepairState::Repairing { candidate, report }
                }

                RepairState::Repairing { candidate, report } => {
                    let revised = self.repair(item, algorithm, &candidate, &report, ctx).await?;
                    RepairState::Testing(revised)
                }

                RepairState::Pass { candidate, report } => {
                    tracing::info!(
                        "Candidate for '{}' passed (plan {}, attempt {})",
                        item.id,
                        candidate.plan_rank,
                        candidate.attempt
                    );
                    return Ok(RepairOutcome { candidate, report });
                }

                RepairState::Exhausted { candidate, report } => {
                    tracing::info!(
                        "Repair budget of {} exhausted for '{}' on plan {}",
                        self.max_repairs,
                        item.id,
                        candidate.plan_rank
                    );
                    return Ok(RepairOutcome { candidate, report });
                }
            };
        }
    }

    async fn repair(
        &self,
        item: &ProblemItem,
        algorithm: &str,
        candidate: &CodeCandidate,
        report: &TestReport,
        ctx: &mut RunContext,
    ) -> Result<CodeCandidate> {
        let prompt = repair_prompt(
            &self.dataset.get_prompt(item),
            &candidate.plan,
            &candidate.code,
            &report.log,
            &algorithm_section(algorithm),
            &self.language,
            self.dataset.requires_std_io(),
        );
        let response = request_completion(self.provider.as_ref(), prompt, ctx).await?;
        ctx.record_repair();

        Ok(candidate.revised(extract_code(&response)))
    }
}
