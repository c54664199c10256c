use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "exemplar-solver")]
#[command(author, version, about = "Exemplar-driven program synthesis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.toml (default: ~/.exemplar-solver/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Solve every problem in a problem set
    Solve {
        /// Problem set file (.json array or .jsonl)
        problems: PathBuf,

        /// Number of exemplars to recall per problem (1-9)
        #[arg(long)]
        k: Option<usize>,

        /// Maximum repair calls per plan
        #[arg(long)]
        t: Option<usize>,

        /// Target programming language
        #[arg(long)]
        language: Option<String>,

        /// Require stdin/stdout programs
        #[arg(long)]
        std_io: bool,

        /// Append one JSONL record per problem to this file
        #[arg(long)]
        run_log: Option<PathBuf>,

        /// Stop after this many problems
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Parse a saved model response and print what the pipeline would see
    Inspect {
        /// File holding the raw response text
        file: PathBuf,

        #[arg(long, value_enum, default_value = "markup")]
        mode: InspectMode,
    },
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum InspectMode {
    /// Structured tag tree (retrieval/verification responses)
    #[default]
    Markup,
    /// Last fenced code block (code generation/repair responses)
    Code,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_solve_overrides() {
        let cli = Cli::try_parse_from([
            "exemplar-solver",
            "solve",
            "problems.jsonl",
            "--k",
            "2",
            "--t",
            "0",
            "--language",
            "Ruby",
            "--std-io",
        ])
        .unwrap();

        match cli.command {
            Commands::Solve {
                problems,
                k,
                t,
                language,
                std_io,
                ..
            } => {
                assert_eq!(problems, PathBuf::from("problems.jsonl"));
                assert_eq!(k, Some(2));
                assert_eq!(t, Some(0));
                assert_eq!(language.as_deref(), Some("Ruby"));
                assert!(std_io);
            }
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn test_parse_inspect_code_mode() {
        let cli = Cli::try_parse_from([
            "exemplar-solver",
            "--verbose",
            "inspect",
            "resp.txt",
            "--mode",
            "code",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Inspect {
                mode: InspectMode::Code,
                ..
            }
        ));
    }
}
