// Dataset collaborator
//
// Renders problem statements for prompting and declares whether generated
// programs must follow standard-input/standard-output conventions.

pub mod problem;
pub mod problem_set;

pub use problem::{render_samples, ProblemItem, SampleTest};
pub use problem_set::ProblemSet;

pub trait Dataset: Send + Sync {
    /// Problem statement as it should appear in prompts
    fn get_prompt(&self, item: &ProblemItem) -> String;

    /// Whether prompts must demand stdin/stdout programs
    fn requires_std_io(&self) -> bool;
}
