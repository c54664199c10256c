// Problem sets loaded from JSON or JSONL files

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::problem::ProblemItem;
use super::Dataset;

/// An ordered collection of problems sharing one set of I/O conventions.
#[derive(Debug, Clone, Default)]
pub struct ProblemSet {
    problems: Vec<ProblemItem>,
    std_io: bool,
}

impl ProblemSet {
    pub fn new(problems: Vec<ProblemItem>, std_io: bool) -> Self {
        Self { problems, std_io }
    }

    /// Load a `.json` array or a `.jsonl` file with one problem per line.
    pub fn load(path: &Path, std_io: bool) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem file {}", path.display()))?;

        let is_jsonl = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("jsonl"));

        let problems = if is_jsonl {
            parse_jsonl(&contents)?
        } else {
            serde_json::from_str::<Vec<ProblemItem>>(&contents)
                .with_context(|| format!("Failed to parse problem file {}", path.display()))?
        };

        tracing::info!("Loaded {} problem(s) from {}", problems.len(), path.display());
        Ok(Self::new(problems, std_io))
    }

    pub fn problems(&self) -> &[ProblemItem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

fn parse_jsonl(contents: &str) -> Result<Vec<ProblemItem>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<ProblemItem>(line)
                .with_context(|| format!("Invalid problem on line {}", idx + 1))
        })
        .collect()
}

impl Dataset for ProblemSet {
    fn get_prompt(&self, item: &ProblemItem) -> String {
        item.statement.clone()
    }

    fn requires_std_io(&self) -> bool {
        self.std_io
    }
}
