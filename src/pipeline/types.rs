// Pipeline data model: exemplars, plannings, code candidates and run counters

use serde::{Deserialize, Serialize};

use crate::evaluation::TestReport;
use crate::providers::Completion;

/// A recalled analogous problem used to seed plan generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemplar {
    pub description: String,
    /// Reference solution sketch
    pub code: String,
    /// Reference plan
    pub planning: String,
}

/// Everything the retrieval call produced for one problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    /// Always a sequence, even when the model returned a single exemplar
    pub exemplars: Vec<Exemplar>,
    /// Algorithm tutorial text
    pub algorithm: String,
}

/// A candidate plan with its self-assessed confidence (0–100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planning {
    pub plan: String,
    pub confidence: u8,
    /// Position of the exemplar this plan was generated from
    pub exemplar_index: usize,
}

/// Order plannings by descending confidence. The sort is stable, so equal
/// confidences keep retrieval order.
pub fn rank_plannings(plannings: &mut [Planning]) {
    plannings.sort_by(|a, b| b.confidence.cmp(&a.confidence));
}

/// One generated program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCandidate {
    pub code: String,
    /// Plan the candidate was generated from
    pub plan: String,
    /// Rank of that plan in the solve order (0 = most trusted)
    pub plan_rank: usize,
    /// 0 for the initial synthesis, 1..=t for repair iterations
    pub attempt: usize,
}

impl CodeCandidate {
    /// Successor produced by a repair call.
    pub fn revised(&self, code: String) -> Self {
        Self {
            code,
            plan: self.plan.clone(),
            plan_rank: self.plan_rank,
            attempt: self.attempt + 1,
        }
    }
}

/// Running token totals for one problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl UsageCounters {
    pub fn add(&mut self, prompt_tokens: u64, completion_tokens: u64) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Per-run counters, owned by the orchestrator and lent to each stage.
///
/// Only increments are exposed; nothing resets mid-run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    api_calls: usize,
    usage: UsageCounters,
    repair_calls: usize,
    evaluations: usize,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one model call and its token usage.
    pub fn record_call(&mut self, completion: &Completion) {
        self.api_calls += 1;
        self.usage
            .add(completion.prompt_tokens, completion.completion_tokens);
    }

    pub fn record_repair(&mut self) {
        self.repair_calls += 1;
    }

    pub fn record_evaluation(&mut self) {
        self.evaluations += 1;
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls
    }

    pub fn usage(&self) -> UsageCounters {
        self.usage
    }

    pub fn repair_calls(&self) -> usize {
        self.repair_calls
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

/// Final result for one problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    /// The passing candidate, or the last attempted one when nothing passed
    pub candidate: CodeCandidate,
    pub passed: bool,
    /// Report from the candidate's last test run
    pub report: TestReport,
    /// Number of ranked plans that reached code synthesis
    pub plans_tried: usize,
    pub api_calls: usize,
    pub usage: UsageCounters,
    pub repair_calls: usize,
    pub evaluations: usize,
}

impl SolveOutcome {
    pub(crate) fn new(
        candidate: CodeCandidate,
        passed: bool,
        report: TestReport,
        plans_tried: usize,
        ctx: &RunContext,
    ) -> Self {
        Self {
            candidate,
            passed,
            report,
            plans_tried,
            api_calls: ctx.api_calls(),
            usage: ctx.usage(),
            repair_calls: ctx.repair_calls(),
            evaluations: ctx.evaluations(),
        }
    }
}
