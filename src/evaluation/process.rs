// Local sample-test runner backed by interpreter subprocesses

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Evaluator, TestReport};
use crate::dataset::{ProblemItem, SampleTest};
use crate::errors::PipelineError;

/// Cap on captured output echoed into a test report.
const MAX_REPORTED_CHARS: usize = 2_000;

/// How to run source files of one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpreter {
    pub program: &'static str,
    pub extension: &'static str,
}

/// Interpreter for a target language name, matched case-insensitively.
pub fn interpreter_for(language: &str) -> Option<Interpreter> {
    let interpreter = match language.trim().to_ascii_lowercase().as_str() {
        "python" | "python3" | "py" => Interpreter {
            program: "python3",
            extension: "py",
        },
        "javascript" | "js" | "node" | "nodejs" => Interpreter {
            program: "node",
            extension: "js",
        },
        "ruby" => Interpreter {
            program: "ruby",
            extension: "rb",
        },
        "php" => Interpreter {
            program: "php",
            extension: "php",
        },
        "bash" | "sh" | "shell" => Interpreter {
            program: "sh",
            extension: "sh",
        },
        _ => return None,
    };
    Some(interpreter)
}

struct RunOutput {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

impl RunOutput {
    fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs candidates with a local interpreter, one process per sample test.
#[derive(Debug, Clone)]
pub struct ProcessEvaluator {
    timeout: Duration,
}

impl ProcessEvaluator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(
        &self,
        interpreter: Interpreter,
        script: &Path,
        stdin: Option<&str>,
    ) -> Result<RunOutput> {
        let mut child = Command::new(interpreter.program)
            .arg(script)
            .current_dir(script.parent().unwrap_or_else(|| Path::new(".")))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn interpreter '{}'", interpreter.program))?;

        // Stdin is fed from its own task so the timeout bounds the write too.
        let writer = match (child.stdin.take(), stdin) {
            (Some(mut pipe), Some(input)) => {
                let input = input.to_string();
                Some(tokio::spawn(async move {
                    if let Err(e) = pipe.write_all(input.as_bytes()).await {
                        tracing::debug!("Candidate did not consume stdin: {}", e);
                    }
                }))
            }
            _ => None,
        };

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;
        if let Some(writer) = writer {
            writer.abort();
        }

        match result {
            Ok(output) => {
                let output = output.context("Failed to collect candidate output")?;
                Ok(RunOutput {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    timed_out: false,
                })
            }
            Err(_) => Ok(RunOutput {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: true,
            }),
        }
    }
}

#[async_trait]
impl Evaluator for ProcessEvaluator {
    async fn evaluate(&self, item: &ProblemItem, code: &str, language: &str) -> Result<TestReport> {
        let interpreter = interpreter_for(language)
            .ok_or_else(|| PipelineError::UnsupportedLanguage(language.to_string()))?;

        if item.sample_tests.is_empty() {
            return Ok(TestReport::pass("No sample tests available."));
        }

        let workdir = tempfile::tempdir().context("Failed to create evaluation directory")?;
        let mut passed = Vec::new();
        let mut failed = Vec::new();

        for (idx, test) in item.sample_tests.iter().enumerate() {
            let script = workdir
                .path()
                .join(format!("candidate_{}.{}", idx, interpreter.extension));

            let entry = match test {
                SampleTest::Io { input, output } => {
                    tokio::fs::write(&script, code)
                        .await
                        .context("Failed to write candidate source")?;
                    let run = self.run(interpreter, &script, Some(input)).await?;
                    let ok = run.succeeded() && outputs_match(&run.stdout, output);
                    (ok, describe_io(input, output, &run))
                }
                SampleTest::Assertion(statement) => {
                    let source = format!("{}\n\n{}\n", code, statement);
                    tokio::fs::write(&script, source)
                        .await
                        .context("Failed to write candidate source")?;
                    let run = self.run(interpreter, &script, None).await?;
                    (run.succeeded(), describe_assertion(statement, &run))
                }
            };

            match entry {
                (true, text) => passed.push(text),
                (false, text) => failed.push(text),
            }
        }

        tracing::debug!(
            "Evaluated '{}': {} passed, {} failed",
            item.id,
            passed.len(),
            failed.len()
        );

        let log = format_log(&passed, &failed);
        Ok(if failed.is_empty() {
            TestReport::pass(log)
        } else {
            TestReport::fail(log)
        })
    }
}

/// Compare outputs line by line, ignoring trailing whitespace and trailing
/// blank lines.
pub(crate) fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

fn normalize(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_REPORTED_CHARS) {
        Some((pos, _)) => &text[..pos],
        None => text,
    }
}

fn failure_note(run: &RunOutput) -> String {
    if run.timed_out {
        return "\nTime limit exceeded.".to_string();
    }
    let mut note = String::new();
    if let Some(code) = run.exit_code.filter(|c| *c != 0) {
        note.push_str(&format!("\nExit code: {}", code));
    }
    if !run.stderr.trim().is_empty() {
        note.push_str(&format!("\nError:\n{}", clip(run.stderr.trim_end())));
    }
    note
}

fn describe_io(input: &str, expected: &str, run: &RunOutput) -> String {
    format!(
        "Input:\n{}\nExpected output:\n{}\nYour output:\n{}{}",
        clip(input.trim_end()),
        clip(expected.trim_end()),
        clip(run.stdout.trim_end()),
        failure_note(run)
    )
}

fn describe_assertion(statement: &str, run: &RunOutput) -> String {
    format!("{}{}", statement.trim_end(), failure_note(run))
}

fn format_log(passed: &[String], failed: &[String]) -> String {
    let mut log = String::new();
    if !passed.is_empty() {
        log.push_str("## Tests passed:\n");
        log.push_str(&passed.join("\n\n"));
        log.push_str("\n\n");
    }
    if !failed.is_empty() {
        log.push_str("## Tests failed:\n");
        log.push_str(&failed.join("\n\n"));
        log.push('\n');
    }
    log
}
