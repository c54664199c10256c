// Response parsing
//
// Recovers structured data from free-form model output: a tag tree from the
// quasi-XML envelopes used by the retrieval and verification stages, and the
// final fenced code block from code-generation and repair responses.

pub mod fence;
pub mod markup;

pub use fence::{extract_code, select_hint, FENCE, LANGUAGE_HINTS};
pub use markup::{
    parse_markup, parse_with_tier, protect_prose, MarkupError, MarkupGroup, MarkupValue,
    ProseTag, RecoveryTier, ROOT_TAG,
};

/// Remove echoed prompt scaffolding lines (e.g. "# Identify the algorithm...")
/// that models copy back into their answers.
pub fn strip_echoes(text: &str, echoes: &[&str]) -> String {
    let mut out = text.to_string();
    for echo in echoes {
        out = out.replace(echo, "");
    }
    out.trim().to_string()
}
