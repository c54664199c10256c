// Evaluation collaborator
//
// Runs a candidate program against a problem's sample tests and reports a
// pass flag plus a diagnostic log for the repair prompt.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dataset::ProblemItem;

pub mod process;

pub use process::{interpreter_for, Interpreter, ProcessEvaluator};

/// Outcome of running one candidate against the sample tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub passed: bool,
    pub log: String,
}

impl TestReport {
    pub fn pass(log: impl Into<String>) -> Self {
        Self {
            passed: true,
            log: log.into(),
        }
    }

    pub fn fail(log: impl Into<String>) -> Self {
        Self {
            passed: false,
            log: log.into(),
        }
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Execute `code` written in `language` against the item's sample tests.
    async fn evaluate(&self, item: &ProblemItem, code: &str, language: &str) -> Result<TestReport>;
}
