// Command handlers behind the `solve` and `inspect` subcommands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::commands::InspectMode;
use crate::config::{load_config, Config};
use crate::dataset::{Dataset, ProblemItem, ProblemSet};
use crate::evaluation::{Evaluator, ProcessEvaluator};
use crate::logging::RunLogger;
use crate::parsing::{extract_code, parse_markup, MarkupGroup, MarkupValue};
use crate::pipeline::{Orchestrator, UsageCounters};
use crate::providers::create_provider;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct SolveOverrides {
    pub k: Option<usize>,
    pub t: Option<usize>,
    pub language: Option<String>,
    pub std_io: bool,
    pub run_log: Option<PathBuf>,
}

impl SolveOverrides {
    /// Apply onto `config` and re-validate.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(k) = self.k {
            config.pipeline.k = k;
        }
        if let Some(t) = self.t {
            config.pipeline.t = t;
        }
        if let Some(language) = &self.language {
            config.pipeline.language = language.clone();
        }
        if self.std_io {
            config.dataset.std_io = true;
        }
        if let Some(path) = &self.run_log {
            config.run_log = Some(path.clone());
        }
        config.validate()
    }
}

/// Totals across a batch of solved problems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    /// Problems the pipeline could not finish at all (e.g. no exemplars)
    pub errored: Vec<String>,
    pub api_calls: usize,
    pub usage: UsageCounters,
}

impl BatchSummary {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Solve `problems` in order, each with its own run context.
///
/// A problem that fails outright is counted and skipped; it does not stop
/// the batch.
pub async fn solve_all(
    orchestrator: &Orchestrator,
    problems: &[ProblemItem],
    language: &str,
    mut logger: Option<&mut RunLogger>,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for (idx, item) in problems.iter().enumerate() {
        summary.total += 1;

        let outcome = match orchestrator.solve(item).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Problem '{}' aborted: {:#}", item.id, e);
                println!("[{}/{}] {}: error ({})", idx + 1, problems.len(), item.id, e);
                summary.errored.push(item.id.clone());
                continue;
            }
        };

        if outcome.passed {
            summary.passed += 1;
        }
        summary.api_calls += outcome.api_calls;
        summary.usage.add(
            outcome.usage.prompt_tokens,
            outcome.usage.completion_tokens,
        );

        println!(
            "[{}/{}] {}: {} (plan {}, attempt {}, {} calls)",
            idx + 1,
            problems.len(),
            item.id,
            if outcome.passed { "passed" } else { "failed" },
            outcome.candidate.plan_rank + 1,
            outcome.candidate.attempt,
            outcome.api_calls
        );

        if let Some(logger) = logger.as_deref_mut() {
            logger.log_outcome(&item.id, language, &outcome)?;
        }
    }

    Ok(summary)
}

/// `solve` subcommand: load config and problems, run the batch, print totals.
pub async fn run_solve(
    config_path: Option<&Path>,
    problems_path: &Path,
    overrides: &SolveOverrides,
    limit: Option<usize>,
) -> Result<BatchSummary> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config)?;

    let provider = create_provider(&config.provider, &config.sampling)?;
    let problem_set = ProblemSet::load(problems_path, config.dataset.std_io)?;
    let problems: Vec<ProblemItem> = problem_set
        .problems()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    let dataset: Arc<dyn Dataset> = Arc::new(problem_set);
    let evaluator: Arc<dyn Evaluator> = Arc::new(ProcessEvaluator::new(Duration::from_secs(
        config.evaluation.timeout_secs,
    )));
    let orchestrator = Orchestrator::new(provider, dataset, evaluator, &config.pipeline);

    tracing::info!(
        "Solving {} problem(s) with {} (k={}, t={}, language={})",
        problems.len(),
        config.provider.display_name(),
        config.pipeline.k,
        config.pipeline.t,
        config.pipeline.language
    );

    let mut logger = match &config.run_log {
        Some(path) => Some(RunLogger::new(path.clone())?),
        None => None,
    };

    let summary = solve_all(
        &orchestrator,
        &problems,
        &config.pipeline.language,
        logger.as_mut(),
    )
    .await?;

    if let Some(logger) = logger.as_mut() {
        logger.flush()?;
        println!("Run log: {}", logger.path().display());
    }

    println!();
    println!(
        "Passed {}/{} ({:.1}%), {} errored",
        summary.passed,
        summary.total,
        summary.pass_rate(),
        summary.errored.len()
    );
    println!(
        "Model calls: {}, tokens: {} prompt / {} completion",
        summary.api_calls, summary.usage.prompt_tokens, summary.usage.completion_tokens
    );

    Ok(summary)
}

/// `inspect` subcommand: render what the parser recovers from a saved response.
pub fn run_inspect(path: &Path, mode: InspectMode) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match mode {
        InspectMode::Code => Ok(extract_code(&text)),
        InspectMode::Markup => {
            let root = parse_markup(&text)
                .with_context(|| format!("No structure recovered from {}", path.display()))?;
            let mut out = String::new();
            render_group(&root, 0, &mut out);
            Ok(out)
        }
    }
}

fn render_group(group: &MarkupGroup, depth: usize, out: &mut String) {
    for tag in group.tags() {
        for value in group.all(tag) {
            render_value(tag, value, depth, out);
        }
    }
}

fn render_value(tag: &str, value: &MarkupValue, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match value {
        MarkupValue::Text(text) => {
            out.push_str(&format!("{indent}{tag}: {}\n", text.trim()));
        }
        MarkupValue::Group(group) => {
            out.push_str(&format!("{indent}{tag}:\n"));
            render_group(group, depth + 1, out);
        }
        MarkupValue::List(items) => {
            for item in items {
                render_value(tag, item, depth, out);
            }
        }
    }
}
