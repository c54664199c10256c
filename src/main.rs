// Exemplar Solver
// Main entry point

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exemplar_solver::cli::{run_inspect, run_solve, Cli, Commands, SolveOverrides};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `--verbose` picks debug for this crate.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("exemplar_solver=debug")
        } else {
            EnvFilter::new("exemplar_solver=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Solve {
            problems,
            k,
            t,
            language,
            std_io,
            run_log,
            limit,
        } => {
            let overrides = SolveOverrides {
                k,
                t,
                language,
                std_io,
                run_log,
            };
            run_solve(cli.config.as_deref(), &problems, &overrides, limit).await?;
            Ok(())
        }
        Commands::Inspect { file, mode } => {
            println!("{}", run_inspect(&file, mode)?);
            Ok(())
        }
    }
}
