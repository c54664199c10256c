// ExemplarRetriever: one model call yielding K analogous problems plus an
// algorithm tutorial

use anyhow::Result;
use std::sync::Arc;

use super::prompts::{retrieval_prompt, RETRIEVAL_ECHOES};
use super::types::{Exemplar, Retrieval, RunContext};
use super::request_completion;
use crate::dataset::{Dataset, ProblemItem};
use crate::errors::PipelineError;
use crate::parsing::{parse_markup, strip_echoes, MarkupError, MarkupGroup};
use crate::providers::LlmProvider;

pub struct ExemplarRetriever {
    provider: Arc<dyn LlmProvider>,
    dataset: Arc<dyn Dataset>,
    k: usize,
    language: String,
}

impl ExemplarRetriever {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dataset: Arc<dyn Dataset>,
        k: usize,
        language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            dataset,
            k,
            language: language.into(),
        }
    }

    /// Ask for `k` exemplars and the algorithm tutorial for `item`.
    ///
    /// Fails with [`PipelineError::NoExemplars`] when the response holds no
    /// usable `problem` group.
    pub async fn retrieve(&self, item: &ProblemItem, ctx: &mut RunContext) -> Result<Retrieval> {
        let problem = self.dataset.get_prompt(item);
        let prompt = retrieval_prompt(&problem, self.k, &self.language);
        let response = request_completion(self.provider.as_ref(), prompt, ctx).await?;

        let retrieval = parse_retrieval(&response, self.k).map_err(|source| {
            PipelineError::MalformedRetrieval {
                problem_id: item.id.clone(),
                source,
            }
        })?;

        if retrieval.exemplars.is_empty() {
            return Err(PipelineError::NoExemplars {
                problem_id: item.id.clone(),
            }
            .into());
        }

        tracing::info!(
            "Retrieved {} exemplar(s) for '{}'",
            retrieval.exemplars.len(),
            item.id
        );
        Ok(retrieval)
    }
}

/// Turn a retrieval response into exemplars and the algorithm text.
///
/// A lone `problem` group is normalised to a one-element list. Groups beyond
/// `k` are dropped. An empty exemplar list is returned as-is; the caller
/// decides whether that is fatal.
pub fn parse_retrieval(response: &str, k: usize) -> Result<Retrieval, MarkupError> {
    let cleaned = strip_echoes(response, RETRIEVAL_ECHOES);
    let root = parse_markup(&cleaned)?;

    let mut exemplars = Vec::new();
    for (idx, value) in root.all("problem").iter().enumerate() {
        match value.as_group() {
            Some(group) => exemplars.push(exemplar_from(group, idx)),
            None => tracing::warn!("Skipping exemplar {} with no description/code/planning", idx),
        }
    }

    if exemplars.len() > k {
        tracing::warn!(
            "Model returned {} exemplars, keeping the first {}",
            exemplars.len(),
            k
        );
        exemplars.truncate(k);
    }

    let algorithm = match root.text("algorithm") {
        Some(text) => text.to_string(),
        None => {
            tracing::warn!("Retrieval response has no algorithm section");
            String::new()
        }
    };

    Ok(Retrieval {
        exemplars,
        algorithm,
    })
}

fn exemplar_from(group: &MarkupGroup, idx: usize) -> Exemplar {
    let field = |tag: &str| match group.text(tag) {
        Some(text) => text.to_string(),
        None => {
            tracing::warn!("Exemplar {} is missing <{}>", idx, tag);
            String::new()
        }
    };

    Exemplar {
        description: field("description"),
        code: field("code"),
        planning: field("planning"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_EXEMPLARS: &str = "```xml\n<root>\n\
        <problem><description>Max of list</description><code>print(max(a))</code>\
        <planning># Planning to solve this problem:\n1. scan</planning></problem>\n\
        <problem><description>Min of list</description><code>print(min(a))</code>\
        <planning>1. scan for min</planning></problem>\n\
        <algorithm>Linear scan. Compare a[i] < best.</algorithm>\n</root>\n```";

    #[test]
    fn test_parse_two_exemplars() {
        let retrieval = parse_retrieval(TWO_EXEMPLARS, 3).unwrap();
        assert_eq!(retrieval.exemplars.len(), 2);
        assert_eq!(retrieval.exemplars[0].description, "Max of list");
        assert_eq!(retrieval.exemplars[0].planning, "1. scan");
        assert_eq!(retrieval.exemplars[1].code, "print(min(a))");
        assert_eq!(retrieval.algorithm, "Linear scan. Compare a[i] < best.");
    }

    #[test]
    fn test_single_exemplar_is_a_list() {
        let text = "<root><problem><description>d</description><code>c</code>\
                    <planning>p</planning></problem><algorithm>a</algorithm></root>";
        let retrieval = parse_retrieval(text, 1).unwrap();
        assert_eq!(retrieval.exemplars.len(), 1);
        assert_eq!(retrieval.exemplars[0].description, "d");
    }

    #[test]
    fn test_extra_exemplars_are_truncated() {
        let retrieval = parse_retrieval(TWO_EXEMPLARS, 1).unwrap();
        assert_eq!(retrieval.exemplars.len(), 1);
        assert_eq!(retrieval.exemplars[0].description, "Max of list");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let text = "<root><problem><description>only this</description></problem></root>";
        let retrieval = parse_retrieval(text, 3).unwrap();
        assert_eq!(retrieval.exemplars[0].code, "");
        assert_eq!(retrieval.exemplars[0].planning, "");
        assert_eq!(retrieval.algorithm, "");
    }

    #[test]
    fn test_no_problem_groups_yields_empty_list() {
        let text = "<root><algorithm>greedy</algorithm></root>";
        let retrieval = parse_retrieval(text, 3).unwrap();
        assert!(retrieval.exemplars.is_empty());
        assert_eq!(retrieval.algorithm, "greedy");
    }

    #[test]
    fn test_unclosed_root_is_recovered() {
        let text = "<root><problem><description>d</description><code>c</code>\
                    <planning>p</planning></problem><algorithm>a</algorithm>";
        let retrieval = parse_retrieval(text, 3).unwrap();
        assert_eq!(retrieval.exemplars.len(), 1);
        assert_eq!(retrieval.algorithm, "a");
    }
}
