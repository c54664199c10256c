// Prompt builders for every model call in the solve pipeline

use super::types::Exemplar;

/// Prompt scaffolding lines models tend to echo into retrieval answers.
pub const RETRIEVAL_ECHOES: &[&str] = &[
    "# Identify the algorithm...",
    "# Write a useful tutorial...",
    "# Planning to solve this problem:",
    "# Let's think step by step...",
];

/// Prompt scaffolding lines models tend to echo into verification answers.
pub const VERIFICATION_ECHOES: &[&str] = &["Discuss whether..."];

/// Extra clause for judges that feed stdin and read stdout.
pub const STD_IO_INSTRUCTION: &str = "## Note: Strictly follow the input and output format. \
The input should be taken from Standard input and output should be given to standard output. \
If you are writing a function then after the function definition take input using `input()` \
function then call the function with specified parameters and finally print the output of the \
function. Do not add extra print statement otherwise it will fail the test cases.";

/// Exemplar count spelled out, e.g. `three (03)`.
pub fn count_words(k: usize) -> String {
    const WORDS: [&str; 9] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    ];
    match WORDS.get(k.wrapping_sub(1)) {
        Some(word) => format!("{} ({:02})", word, k),
        None => k.to_string(),
    }
}

pub fn algorithm_section(algorithm: &str) -> String {
    format!("## Relevant Algorithm to solve the next problem:\n{}", algorithm)
}

pub fn samples_section(rendered_samples: &str) -> String {
    format!("## Sample Test cases: \n{}\n", rendered_samples)
}

fn std_io_clause(std_io: bool) -> &'static str {
    if std_io {
        STD_IO_INSTRUCTION
    } else {
        ""
    }
}

pub fn retrieval_prompt(problem: &str, k: usize, language: &str) -> String {
    let count = count_words(k);
    format!(
        "Given a problem, provide relevant problems then identify the algorithm behind it and also explain the tutorial of the algorithm.\n\
         # Problem:\n\
         {problem}\n\n\
         # Exemplars:\n\
         Recall {count} relevant and distinct problems (different from problem mentioned above). For each problem,\n\
         1. describe it\n\
         2. generate {language} code step by step to solve that problem\n\
         3. finally generate a planning to solve that problem\n\n\
         # Algorithm:\n\n\
         ----------------\n\
         Important:\n\
         Your response must follow the following xml format-\n\n\
         <root>\n\
         <problem>\n\
         # Recall {count} relevant and distinct problems (different from problem mentioned above). Write each problem in the following format.\n\
         <description>\n\
         # Describe the problem.\n\
         </description>\n\
         <code>\n\
         # Let's think step by step to solve this problem in {language} programming language.\n\
         </code>\n\
         <planning>\n\
         # Planning to solve this problem.\n\
         </planning>\n\
         </problem>\n\n\
         # similarly add more problems here...\n\n\
         <algorithm>\n\
         # Identify the algorithm (Brute-force, Dynamic Programming, Divide-and-conquer, Greedy, Backtracking, Recursive, Binary search, and so on) that needs to be used to solve the original problem.\n\
         # Write a useful tutorial about the above mentioned algorithms. Provide a high level generic tutorial for solving this types of problem. Do not generate code.\n\
         </algorithm>\n\
         </root>\n"
    )
}

pub fn planning_prompt(
    exemplar: &Exemplar,
    algorithm_section: &str,
    problem: &str,
    samples_section: &str,
) -> String {
    format!(
        "Given a competitive programming problem generate a concrete planning to solve the problem.\n\
         # Problem:\n{}\n\
         # Planning:\n{}\n\
         {}\n\
         ## Problem to be solved:\n{}\n\
         {}\n\
         ## Planning:\n\n\
         ----------------\n\
         Important: You should give only the planning to solve the problem. Do not add extra explanation or words.",
        exemplar.description, exemplar.planning, algorithm_section, problem, samples_section
    )
}

pub fn verification_prompt(problem: &str, plan: &str, language: &str) -> String {
    format!(
        "Given a competitive programming problem and a plan to solve the problem in {language}, tell whether the plan is correct to solve this problem.\n\n\
         # Problem:\n{problem}\n\
         # Planning:\n{plan}\n\n\
         ----------------\n\
         Important: Your response must follow the following xml format-```\n\
         <root>\n\
         <explanation> Discuss whether the given competitive programming problem is solvable by using the above mentioned planning.</explanation>\n\
         <confidence> Confidence score regarding the solvability of the problem. Must be an integer between 0 and 100. </confidence>\n\
         </root>\n\
         ```"
    )
}

pub fn code_prompt(
    problem: &str,
    plan: &str,
    algorithm_section: &str,
    samples_section: &str,
    language: &str,
    std_io: bool,
) -> String {
    format!(
        "Given a competitive programming problem generate {language} code to solve the problem.\n\
         {algorithm_section}\n\
         ## Problem to be solved:\n{problem}\n\
         ## Planning:\n{plan}\n\
         {samples_section}\n\
         ## Let's think step by step.\n\n\
         ----------------\n\
         Important:\n\
         {std_io}\n\
         ## Your response must contain only the {language} code to solve this problem. Do not add extra explanation or words.",
        std_io = std_io_clause(std_io),
    )
}

pub fn repair_prompt(
    problem: &str,
    plan: &str,
    code: &str,
    test_log: &str,
    algorithm_section: &str,
    language: &str,
    std_io: bool,
) -> String {
    format!(
        "Given a competitive programming problem you have generated {language} code to solve the problem. But the generated code can not pass sample test cases. Improve your code to solve the problem correctly.\n\
         {algorithm_section}\n\
         ## Problem to be solved:\n{problem}\n\
         ## Planning: {plan}\n\
         ## Code:\n```\n{code}\n```\n\
         ## Test Report:\n{test_log}\n\
         ## Modified Planning:\n\
         ## Let's think step by step to modify {language} Code for solving this problem.\n\n\
         ----------------\n\
         Important:\n\
         {std_io}\n\
         ## Your response must contain the modified planning and then the {language} code inside ``` block to solve this problem.",
        std_io = std_io_clause(std_io),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(1), "one (01)");
        assert_eq!(count_words(3), "three (03)");
        assert_eq!(count_words(9), "nine (09)");
        assert_eq!(count_words(0), "0");
        assert_eq!(count_words(12), "12");
    }

    #[test]
    fn test_retrieval_prompt_names_count_and_language() {
        let prompt = retrieval_prompt("Sum two numbers", 2, "Python3");
        assert!(prompt.contains("Recall two (02) relevant and distinct problems"));
        assert!(prompt.contains("in Python3 programming language"));
        assert!(prompt.contains("<algorithm>"));
    }

    #[test]
    fn test_std_io_clause_toggles() {
        let with = code_prompt("p", "plan", "alg", "samples", "Python3", true);
        let without = code_prompt("p", "plan", "alg", "samples", "Python3", false);
        assert!(with.contains("Standard input"));
        assert!(!without.contains("Standard input"));

        let repair = repair_prompt("p", "plan", "code", "log", "alg", "Python3", true);
        assert!(repair.contains("Standard input"));
    }

    #[test]
    fn test_repair_prompt_fences_current_code() {
        let prompt = repair_prompt("p", "plan", "print(1)", "failed", "alg", "Python3", false);
        assert!(prompt.contains("## Code:\n```\nprint(1)\n```"));
        assert!(prompt.contains("## Test Report:\nfailed"));
    }

    #[test]
    fn test_planning_prompt_includes_exemplar() {
        let exemplar = Exemplar {
            description: "Find max".to_string(),
            code: "max(a)".to_string(),
            planning: "scan once".to_string(),
        };
        let prompt = planning_prompt(&exemplar, "## alg", "Target", "## samples");
        assert!(prompt.contains("# Problem:\nFind max"));
        assert!(prompt.contains("# Planning:\nscan once"));
        assert!(prompt.contains("## Problem to be solved:\nTarget"));
    }
}
