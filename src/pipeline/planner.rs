// PlanningEngine: one plan plus one verification per exemplar, then ranking

use anyhow::Result;
use std::sync::Arc;

use super::prompts::{
    algorithm_section, planning_prompt, samples_section, verification_prompt, VERIFICATION_ECHOES,
};
use super::request_completion;
use super::types::{rank_plannings, Planning, Retrieval, RunContext};
use crate::dataset::{render_samples, Dataset, ProblemItem};
use crate::parsing::{parse_markup, strip_echoes};
use crate::providers::LlmProvider;

pub struct PlanningEngine {
    provider: Arc<dyn LlmProvider>,
    dataset: Arc<dyn Dataset>,
    language: String,
}

impl PlanningEngine {
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

    /// Generate and score one plan per exemplar, most trusted first.
    ///
    /// Issues exactly two model calls per exemplar, in exemplar order.
    pub async fn plan(
        &self,
        item: &ProblemItem,
        retrieval: &Retrieval,
        ctx: &mut RunContext,
    ) -> Result<Vec<Planning>> {
        let problem = self.dataset.get_prompt(item);
        let algorithm = algorithm_section(&retrieval.algorithm);
        let samples = samples_section(&render_samples(&item.sample_tests));

        let mut plannings = Vec::with_capacity(retrieval.exemplars.len());
        for (idx, exemplar) in retrieval.exemplars.iter().enumerate() {
            let prompt = planning_prompt(exemplar, &algorithm, &problem, &samples);
            let plan = request_completion(self.provider.as_ref(), prompt, ctx).await?;

            let prompt = verification_prompt(&problem, &plan, &self.language);
            let verdict = request_completion(self.provider.as_ref(), prompt, ctx).await?;
            let confidence = parse_confidence(&verdict);

            tracing::info!("Plan {} for '{}' scored {}", idx, item.id, confidence);
            plannings.push(Planning {
                plan,
                confidence,
                exemplar_index: idx,
            });
        }

        rank_plannings(&mut plannings);
        Ok(plannings)
    }
}

/// Confidence from a verification response, clamped to 0..=100.
///
/// Anything unparseable (no markup, no `confidence` tag, a non-integer
/// value) scores 0.
pub fn parse_confidence(response: &str) -> u8 {
    let cleaned = strip_echoes(response, VERIFICATION_ECHOES);
    let root = match parse_markup(&cleaned) {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!("Unreadable verification response, confidence 0: {}", e);
            return 0;
        }
    };

    let Some(raw) = root.text("confidence") else {
        tracing::warn!("Verification response has no confidence, using 0");
        return 0;
    };

    match raw.trim().parse::<i64>() {
        Ok(value) => value.clamp(0, 100) as u8,
        Err(_) => {
            tracing::warn!("Non-integer confidence '{}', using 0", raw.trim());
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_parsed() {
        let text = "<root><explanation>Works since a < b</explanation>\
                    <confidence> 85 </confidence></root>";
        assert_eq!(parse_confidence(text), 85);
    }

    #[test]
    fn test_confidence_inside_fenced_xml() {
        let text = "```xml\n<root>\n<explanation>ok</explanation>\n<confidence>100</confidence>\n</root>\n```";
        assert_eq!(parse_confidence(text), 100);
    }

    #[test]
    fn test_non_integer_confidence_is_zero() {
        let text = "<root><explanation>x</explanation><confidence>high</confidence></root>";
        assert_eq!(parse_confidence(text), 0);
        let text = "<root><confidence>87.5</confidence></root>";
        assert_eq!(parse_confidence(text), 0);
    }

    #[test]
    fn test_missing_confidence_is_zero() {
        assert_eq!(parse_confidence("<root><explanation>x</explanation></root>"), 0);
        assert_eq!(parse_confidence("I think it is fine."), 0);
        assert_eq!(parse_confidence(""), 0);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(parse_confidence("<root><confidence>250</confidence></root>"), 100);
        assert_eq!(parse_confidence("<root><confidence>-5</confidence></root>"), 0);
    }

    #[test]
    fn test_echoed_placeholder_is_stripped() {
        let text = "<root><explanation>Discuss whether...</explanation>\
                    <confidence>40</confidence></root>";
        assert_eq!(parse_confidence(text), 40);
    }
}
