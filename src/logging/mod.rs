// Run logging
//
// Appends one JSONL record per solved problem so batch runs can be scored
// and compared afterwards.

pub mod run_logger;

pub use run_logger::{read_records, RunLogger, RunRecord};
