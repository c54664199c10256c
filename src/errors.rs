// Error types and user-facing error message helpers

use thiserror::Error;

use crate::parsing::MarkupError;

/// Failures the solve pipeline does not paper over.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The retrieval response yielded no usable exemplar, so there is
    /// nothing to plan from.
    #[error("retrieval response for problem '{problem_id}' contained no exemplars")]
    NoExemplars { problem_id: String },

    /// Every markup recovery tier failed on the retrieval response.
    #[error("retrieval response for problem '{problem_id}' could not be parsed: {source}")]
    MalformedRetrieval {
        problem_id: String,
        #[source]
        source: MarkupError,
    },

    /// The local evaluator has no way to run programs in this language.
    #[error("no local runner for language '{0}'")]
    UnsupportedLanguage(String),
}

/// Append a suggestion block to an error message.
pub fn wrap_error_with_suggestion(message: impl Into<String>, suggestion: &str) -> String {
    format!("{}\n\n{}", message.into(), suggestion)
}

pub fn config_parse_error(details: &str) -> String {
    wrap_error_with_suggestion(
        format!("Failed to parse configuration file: {}", details),
        "Check the TOML syntax of your config file.\n\
         Expected sections: [provider] and [pipeline]",
    )
}

pub fn api_key_invalid_error(provider: &str) -> String {
    wrap_error_with_suggestion(
        format!("API key for provider '{}' is empty", provider),
        "Set `api_key` under [provider] in your config file,\n\
         or export OPENAI_API_KEY=\"sk-...\"",
    )
}

pub fn file_not_found_error(path: &str, what: &str) -> String {
    wrap_error_with_suggestion(
        format!("{} not found or unreadable: {}", what, path),
        "Check that the path exists and is readable.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_error_with_suggestion() {
        let msg = wrap_error_with_suggestion("Bad thing", "Try this");
        assert_eq!(msg, "Bad thing\n\nTry this");
    }

    #[test]
    fn test_no_exemplars_message_names_problem() {
        let err = PipelineError::NoExemplars {
            problem_id: "cf-1A".to_string(),
        };
        assert!(err.to_string().contains("cf-1A"));
    }
}
