// Problem items and their sample tests

use serde::{Deserialize, Serialize};

/// One sample test attached to a problem.
///
/// Contest-style problems carry input/expected-output pairs; function-style
/// problems carry assertion statements appended to the candidate program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleTest {
    Io {
        input: String,
        #[serde(deserialize_with = "expected_output")]
        output: String,
    },
    Assertion(String),
}

impl SampleTest {
    pub fn io(input: impl Into<String>, output: impl Into<String>) -> Self {
        SampleTest::Io {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn assertion(statement: impl Into<String>) -> Self {
        SampleTest::Assertion(statement.into())
    }
}

/// Expected output may be stored as a string or as a list of accepted
/// outputs; only the first is used.
fn expected_output<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => s,
        OneOrMany::Many(v) => v.into_iter().next().unwrap_or_default(),
    })
}

/// A problem to solve: identifier, statement, and ordered sample tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemItem {
    #[serde(alias = "task_id", alias = "name")]
    pub id: String,

    #[serde(alias = "description", alias = "prompt")]
    pub statement: String,

    #[serde(default, alias = "sample_io")]
    pub sample_tests: Vec<SampleTest>,
}

impl ProblemItem {
    pub fn new(id: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
            sample_tests: Vec::new(),
        }
    }

    pub fn with_sample(mut self, sample: SampleTest) -> Self {
        self.sample_tests.push(sample);
        self
    }
}

/// Render sample tests for the "Sample Test cases" prompt block.
pub fn render_samples(samples: &[SampleTest]) -> String {
    samples
        .iter()
        .map(|sample| match sample {
            SampleTest::Io { input, output } => {
                format!("Input:\n{}\nExpected output:\n{}", input, output)
            }
            SampleTest::Assertion(statement) => statement.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
