// Run log: one JSONL record per solved problem

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::pipeline::SolveOutcome;

/// A single logged solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique ID for this record
    pub id: String,

    pub timestamp: DateTime<Utc>,

    pub problem_id: String,

    pub language: String,

    pub passed: bool,

    /// Final candidate source
    pub code: String,

    /// Rank of the plan that produced `code` (0 = highest confidence)
    pub plan_rank: usize,

    /// Repair iteration of `code` (0 = initial synthesis)
    pub attempt: usize,

    pub api_calls: usize,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub repair_calls: usize,
    pub evaluations: usize,
}

impl RunRecord {
    pub fn new(problem_id: &str, language: &str, outcome: &SolveOutcome) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            problem_id: problem_id.to_string(),
            language: language.to_string(),
            passed: outcome.passed,
            code: outcome.candidate.code.clone(),
            plan_rank: outcome.candidate.plan_rank,
            attempt: outcome.candidate.attempt,
            api_calls: outcome.api_calls,
            prompt_tokens: outcome.usage.prompt_tokens,
            completion_tokens: outcome.usage.completion_tokens,
            repair_calls: outcome.repair_calls,
            evaluations: outcome.evaluations,
        }
    }
}

/// Buffered JSONL writer for [`RunRecord`]s. Appends, never truncates.
pub struct RunLogger {
    log_path: PathBuf,
    buffer: Vec<RunRecord>,
    flush_threshold: usize,
}

impl RunLogger {
    pub fn new(log_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create run log directory")?;
            }
        }

        Ok(Self {
            log_path,
            buffer: Vec::new(),
            flush_threshold: 10,
        })
    }

    /// Record one outcome; returns the record id.
    pub fn log_outcome(
        &mut self,
        problem_id: &str,
        language: &str,
        outcome: &SolveOutcome,
    ) -> Result<String> {
        let record = RunRecord::new(problem_id, language, outcome);
        let id = record.id.clone();
        self.buffer.push(record);

        if self.buffer.len() >= self.flush_threshold {
            self.flush()?;
        }

        Ok(id)
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        debug!("Flushing {} run records to disk", self.buffer.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open run log {}", self.log_path.display()))?;

        for record in &self.buffer {
            let json = serde_json::to_string(record).context("Failed to serialize run record")?;
            writeln!(file, "{}", json).context("Failed to write run record")?;
        }

        self.buffer.clear();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Failed to flush run log on drop: {}", e);
        }
    }
}

/// Read every record back from a run log.
pub fn read_records(path: &Path) -> Result<Vec<RunRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run log {}", path.display()))?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("Failed to parse run record"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::TestReport;
    use crate::pipeline::{CodeCandidate, UsageCounters};
    use tempfile::TempDir;

    fn outcome(passed: bool) -> SolveOutcome {
        SolveOutcome {
            candidate: CodeCandidate {
                code: "print(3)".to_string(),
                plan: "add".to_string(),
                plan_rank: 1,
                attempt: 2,
            },
            passed,
            report: TestReport::pass(""),
            plans_tried: 2,
            api_calls: 9,
            usage: UsageCounters {
                prompt_tokens: 120,
                completion_tokens: 80,
            },
            repair_calls: 2,
            evaluations: 3,
        }
    }

    #[test]
    fn test_log_and_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runs").join("log.jsonl");

        let mut logger = RunLogger::new(path.clone()).unwrap();
        let id = logger.log_outcome("p1", "Python3", &outcome(true)).unwrap();
        logger.flush().unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].problem_id, "p1");
        assert!(records[0].passed);
        assert_eq!(records[0].plan_rank, 1);
        assert_eq!(records[0].prompt_tokens, 120);
        assert_eq!(records[0].evaluations, 3);
    }

    #[test]
    fn test_drop_flushes_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");

        {
            let mut logger = RunLogger::new(path.clone()).unwrap();
            logger.log_outcome("a", "Python3", &outcome(true)).unwrap();
        }
        {
            let mut logger = RunLogger::new(path.clone()).unwrap();
            logger.log_outcome("b", "Python3", &outcome(false)).unwrap();
        }

        let records = read_records(&path).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.problem_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!records[1].passed);
    }
}
