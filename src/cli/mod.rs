// CLI module
// Public interface for command-line interface

mod commands;
mod runner;

pub use commands::{Cli, Commands, InspectMode};
pub use runner::{run_inspect, run_solve, solve_all, BatchSummary, SolveOverrides};
