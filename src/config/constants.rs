// Project-wide constants
//
// Centralised here so defaults have one source of truth. Import via
// `use crate::config::constants::*;`.

/// Default maximum tokens per completion request.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default number of exemplars recalled per problem.
pub const DEFAULT_EXEMPLARS: usize = 3;

/// Exemplar counts are spelled out in the retrieval prompt, one through nine.
pub const MAX_EXEMPLARS: usize = 9;

/// Default number of repair calls allowed per plan.
pub const DEFAULT_REPAIR_ATTEMPTS: usize = 5;

/// Default target language for generated programs.
pub const DEFAULT_LANGUAGE: &str = "Python3";

/// Default wall-clock limit for one sample-test process run.
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 10;

/// Directory under the home directory holding config and run logs.
pub const APP_DIR: &str = ".exemplar-solver";

/// Environment variable consulted when no config file exists.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
