// Configuration loader
// Loads settings from a TOML file (explicit path or ~/.exemplar-solver/config.toml)
// with the API key falling back to an environment variable

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{API_KEY_ENV, APP_DIR};
use super::provider::ProviderEntry;
use super::settings::{Config, DatasetConfig, EvaluationConfig, PipelineConfig, SamplingSettings};
use crate::errors;

#[derive(Deserialize)]
struct TomlConfig {
    #[serde(default)]
    provider: Option<ProviderEntry>,
    #[serde(default)]
    sampling: SamplingSettings,
    #[serde(default)]
    pipeline: PipelineConfig,
    #[serde(default)]
    evaluation: EvaluationConfig,
    #[serde(default)]
    dataset: DatasetConfig,
    #[serde(default)]
    run_log: Option<PathBuf>,
}

/// Default config location: `~/.exemplar-solver/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR).join("config.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one the default location is tried,
/// then the `OPENAI_API_KEY` environment variable.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());

    let file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|p| p.exists()),
    };

    let config = match file {
        Some(file) => {
            let contents = fs::read_to_string(&file).map_err(|_| {
                anyhow::anyhow!(errors::file_not_found_error(
                    &file.display().to_string(),
                    "Configuration file"
                ))
            })?;
            tracing::debug!("Loading configuration from {}", file.display());
            parse_config(&contents, env_key.as_deref())?
        }
        None => match env_key {
            Some(api_key) => Config::with_provider(ProviderEntry::Openai {
                api_key,
                model: None,
                base_url: None,
                name: Some("OpenAI (Environment)".to_string()),
            }),
            None => bail!(
                "No configuration found.\n\n\
                 Create ~/{}/config.toml with a [provider] section, pass --config <path>,\n\
                 or set the environment variable:\n  \
                 export {}=\"sk-...\"",
                APP_DIR,
                API_KEY_ENV
            ),
        },
    };

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Parse TOML contents. When the file has no `[provider]` section,
/// `env_api_key` supplies an OpenAI provider.
pub fn parse_config(contents: &str, env_api_key: Option<&str>) -> Result<Config> {
    let toml_config: TomlConfig = toml::from_str(contents)
        .map_err(|e| anyhow::anyhow!(errors::config_parse_error(&e.to_string())))?;

    let provider = match (toml_config.provider, env_api_key) {
        (Some(provider), _) => provider,
        (None, Some(api_key)) => ProviderEntry::Openai {
            api_key: api_key.to_string(),
            model: None,
            base_url: None,
            name: Some("OpenAI (Environment)".to_string()),
        },
        (None, None) => bail!(errors::wrap_error_with_suggestion(
            "Config has no [provider] section",
            &format!("Add a [provider] section or export {}", API_KEY_ENV)
        )),
    };

    Ok(Config {
        provider,
        sampling: toml_config.sampling,
        pipeline: toml_config.pipeline,
        evaluation: toml_config.evaluation,
        dataset: toml_config.dataset,
        run_log: toml_config.run_log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            run_log = "/tmp/runs.jsonl"

            [provider]
            type = "openai"
            api_key = "sk-abc"
            model = "gpt-4o-mini"

            [sampling]
            temperature = 0.0
            max_tokens = 2048

            [pipeline]
            k = 5
            t = 3
            language = "Python3"

            [evaluation]
            timeout_secs = 4

            [dataset]
            std_io = true
            "#,
            None,
        )
        .unwrap();

        assert_eq!(config.provider.model(), Some("gpt-4o-mini"));
        assert_eq!(config.sampling.temperature, Some(0.0));
        assert_eq!(config.sampling.max_tokens, Some(2048));
        assert_eq!(config.pipeline.k, 5);
        assert_eq!(config.pipeline.t, 3);
        assert_eq!(config.evaluation.timeout_secs, 4);
        assert!(config.dataset.std_io);
        assert_eq!(config.run_log, Some(PathBuf::from("/tmp/runs.jsonl")));
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config = parse_config(
            r#"
            [provider]
            type = "ollama"
            model = "qwen2.5-coder"
            "#,
            None,
        )
        .unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert!(!config.dataset.std_io);
        assert!(config.run_log.is_none());
    }

    #[test]
    fn test_env_key_fills_missing_provider() {
        let config = parse_config("[pipeline]\nk = 2\n", Some("sk-env")).unwrap();
        assert_eq!(config.provider.api_key(), Some("sk-env"));
        assert_eq!(config.pipeline.k, 2);
    }

    #[test]
    fn test_no_provider_no_env_is_error() {
        assert!(parse_config("[pipeline]\nk = 2\n", None).is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let err = parse_config("[provider\ntype = ", None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse configuration file"));
    }

    #[test]
    fn test_load_from_explicit_path_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[provider]\ntype = \"openai\"\napi_key = \"sk-file\"\n\n[pipeline]\nk = 12"
        )
        .unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("pipeline.k = 12"));
    }

    #[test]
    fn test_load_missing_explicit_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/solver.toml"))).unwrap_err();
        assert!(err.to_string().contains("Configuration file"));
    }
}
