// Configuration structs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::constants::*;
use super::provider::ProviderEntry;
use crate::errors;

/// Solve pipeline knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of analogous problems recalled per target problem (K)
    #[serde(default = "default_exemplars")]
    pub k: usize,

    /// Maximum repair calls per plan (t); 0 means test once and never repair
    #[serde(default = "default_repair_attempts")]
    pub t: usize,

    /// Target language named in every prompt and passed to the evaluator
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_EXEMPLARS,
            t: DEFAULT_REPAIR_ATTEMPTS,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

fn default_exemplars() -> usize {
    DEFAULT_EXEMPLARS
}

fn default_repair_attempts() -> usize {
    DEFAULT_REPAIR_ATTEMPTS
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Per-request sampling defaults applied by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Local sample-test execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Wall-clock limit for one program run, in seconds
    #[serde(default = "default_eval_timeout")]
    pub timeout_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_EVAL_TIMEOUT_SECS,
        }
    }
}

fn default_eval_timeout() -> u64 {
    DEFAULT_EVAL_TIMEOUT_SECS
}

/// Problem-set conventions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Programs must read stdin and write stdout (contest-style judges)
    #[serde(default)]
    pub std_io: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Which service answers the prompts
    pub provider: ProviderEntry,

    /// Sampling defaults for every request
    pub sampling: SamplingSettings,

    /// K, t and target language
    pub pipeline: PipelineConfig,

    /// Sample-test runner settings
    pub evaluation: EvaluationConfig,

    /// Problem-set conventions
    pub dataset: DatasetConfig,

    /// JSONL file receiving one record per solved problem (optional)
    pub run_log: Option<PathBuf>,
}

impl Config {
    /// Config with default sections around a provider entry
    pub fn with_provider(provider: ProviderEntry) -> Self {
        Self {
            provider,
            sampling: SamplingSettings::default(),
            pipeline: PipelineConfig::default(),
            evaluation: EvaluationConfig::default(),
            dataset: DatasetConfig::default(),
            run_log: None,
        }
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(key) = self.provider.api_key() {
            if key.trim().is_empty() {
                anyhow::bail!(errors::api_key_invalid_error(self.provider.provider_type()));
            }
        }

        if self.pipeline.k == 0 || self.pipeline.k > MAX_EXEMPLARS {
            anyhow::bail!(errors::wrap_error_with_suggestion(
                format!("pipeline.k = {} is out of range", self.pipeline.k),
                &format!(
                    "The number of recalled exemplars must be between 1 and {}.\n\
                     Recommended: 3",
                    MAX_EXEMPLARS
                )
            ));
        }

        if self.pipeline.language.trim().is_empty() {
            anyhow::bail!("pipeline.language must not be empty");
        }

        if self.evaluation.timeout_secs == 0 {
            anyhow::bail!("evaluation.timeout_secs must be greater than 0");
        }

        if let Some(temperature) = self.sampling.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                anyhow::bail!(errors::wrap_error_with_suggestion(
                    format!("sampling.temperature = {} is out of range", temperature),
                    "Temperature must be between 0.0 and 2.0"
                ));
            }
        }

        if self.sampling.max_tokens == Some(0) {
            anyhow::bail!("sampling.max_tokens must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai() -> ProviderEntry {
        ProviderEntry::Openai {
            api_key: "sk-test".to_string(),
            model: None,
            base_url: None,
            name: None,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = Config::with_provider(openai());
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.k, 3);
        assert_eq!(config.pipeline.t, 5);
        assert_eq!(config.pipeline.language, "Python3");
    }

    #[test]
    fn test_k_out_of_range_rejected() {
        let mut config = Config::with_provider(openai());
        config.pipeline.k = 0;
        assert!(config.validate().is_err());
        config.pipeline.k = 10;
        assert!(config.validate().is_err());
        config.pipeline.k = 9;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_repairs_allowed() {
        let mut config = Config::with_provider(openai());
        config.pipeline.t = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = Config::with_provider(ProviderEntry::Openai {
            api_key: "  ".to_string(),
            model: None,
            base_url: None,
            name: None,
        });
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("openai"));
    }

    #[test]
    fn test_temperature_range() {
        let mut config = Config::with_provider(openai());
        config.sampling.temperature = Some(3.5);
        assert!(config.validate().is_err());
    }
}
