// Exemplar Solver - exemplar-driven program synthesis
// Library exports

// Core modules
pub mod errors;
pub mod parsing;
pub mod pipeline;

// Collaborators
pub mod dataset;
pub mod evaluation;
pub mod providers;

// Application shell
pub mod cli;
pub mod config;
pub mod logging;
