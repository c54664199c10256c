// Fenced code block extraction

use regex::Regex;

pub const FENCE: &str = "```";

/// Language hints recognised after an opening fence.
///
/// When several hints appear in one response the one listed last wins, so the
/// more specific spellings (`python3` over `python`) sit further down.
pub const LANGUAGE_HINTS: &[&str] = &[
    "Python", "Python3", "python", "python3", "C", "c", "C++", "c++", "cpp", "Java", "java",
    "Node", "node", "Rust", "rust", "PHP", "php", "Go", "go", "Ruby", "ruby", "C#", "c#",
    "csharp",
];

/// Return the final fenced code block in `text`.
///
/// If any hinted fence is present only blocks opened with that hint are
/// considered. Text without any fence is returned unchanged.
pub fn extract_code(text: &str) -> String {
    if !text.contains(FENCE) {
        return text.to_string();
    }

    let hint = select_hint(text);
    let blocks = fenced_blocks(text, hint);

    if let Some(last) = blocks.last() {
        return clean_block(last, hint.is_none());
    }

    // An opening fence with no closing fence: the response was cut off
    // mid-block, so keep whatever follows the last opener.
    let opener = format!("{FENCE}{}", hint.unwrap_or(""));
    match text.rfind(&opener) {
        Some(pos) => {
            let rest = &text[pos + opener.len()..];
            let code = clean_block(rest, hint.is_none());
            if code.is_empty() {
                text.to_string()
            } else {
                code
            }
        }
        None => text.to_string(),
    }
}

/// The hint whose fenced blocks should be extracted, if any hinted fence is
/// present.
pub fn select_hint(text: &str) -> Option<&'static str> {
    LANGUAGE_HINTS
        .iter()
        .copied()
        .filter(|hint| has_hinted_fence(text, hint))
        .last()
}

fn has_hinted_fence(text: &str, hint: &str) -> bool {
    let marker = format!("{FENCE}{hint}");
    text.match_indices(&marker).any(|(pos, _)| {
        text[pos + marker.len()..]
            .chars()
            .next()
            .map_or(true, is_hint_boundary)
    })
}

/// `C` must not claim a `C++` or `C#` fence, nor `go` a `golang` one.
fn is_hint_boundary(c: char) -> bool {
    !(c.is_alphanumeric() || c == '+' || c == '#' || c == '_')
}

fn fenced_blocks(text: &str, hint: Option<&str>) -> Vec<String> {
    let fence = regex::escape(FENCE);
    let pattern = match hint {
        Some(hint) => format!(r"(?s){fence}{}([^\w+#].*?)?{fence}", regex::escape(hint)),
        None => format!(r"(?s){fence}(.*?){fence}"),
    };

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("Invalid fence pattern {:?}: {}", pattern, e);
            return Vec::new();
        }
    };

    re.captures_iter(text)
        .map(|caps| caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect()
}

/// Trim the block and, for unhinted fences, drop an info string such as
/// `text` or `plaintext` written on the opening line.
fn clean_block(block: &str, unhinted: bool) -> String {
    let mut body = block;
    if unhinted && !body.starts_with(['\n', '\r']) {
        if let Some((first, rest)) = body.split_once('\n') {
            if is_info_string(first.trim()) {
                body = rest;
            }
        }
    }
    body.trim_start_matches(['\n', '\r']).trim_end().to_string()
}

/// A language tag such as `text`, `plaintext`, `objective-c` or `f#`.
/// Anything with code punctuation (`x=1`, `print(x)`) is not one.
fn is_info_string(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fence_returns_input_unchanged() {
        let text = "print(input())\n";
        assert_eq!(extract_code(text), text);
    }

    #[test]
    fn test_last_hinted_block_wins() {
        let text = "Plan first:\n```python\nprint(1)\n```\nThen final:\n```python\nprint(2)\n```\n";
        assert_eq!(extract_code(text), "print(2)");
    }

    #[test]
    fn test_hinted_block_preferred_over_bare() {
        let text = "```\nstep 1\nstep 2\n```\n```python3\nn = int(input())\nprint(n * 2)\n```";
        assert_eq!(extract_code(text), "n = int(input())\nprint(n * 2)");
    }

    #[test]
    fn test_more_specific_hint_wins() {
        let text = "```python\na = 1\n```\n```python3\nb = 2\n```";
        assert_eq!(select_hint(text), Some("python3"));
        assert_eq!(extract_code(text), "b = 2");
    }

    #[test]
    fn test_c_does_not_match_cpp_fence() {
        let text = "```cpp\nint main() { return 0; }\n```";
        assert_eq!(select_hint(text), Some("cpp"));
        assert_eq!(extract_code(text), "int main() { return 0; }");
    }

    #[test]
    fn test_c_sharp_hint() {
        let text = "```C#\nclass P {}\n```";
        assert_eq!(select_hint(text), Some("C#"));
        assert_eq!(extract_code(text), "class P {}");
    }

    #[test]
    fn test_bare_fence_drops_info_string() {
        let text = "```text\nhello\n```";
        assert_eq!(extract_code(text), "hello");
    }

    #[test]
    fn test_bare_fence_keeps_code_on_opening_line() {
        assert_eq!(extract_code("```x=1\nprint(x)\n```"), "x=1\nprint(x)");
        assert_eq!(extract_code("```print(1)\nprint(2)\n```"), "print(1)\nprint(2)");
        assert_eq!(extract_code("```a;\nb\n```"), "a;\nb");
    }

    #[test]
    fn test_info_string_shapes() {
        assert!(is_info_string("plaintext"));
        assert!(is_info_string("objective-c"));
        assert!(is_info_string("f#"));
        assert!(!is_info_string("x=1"));
        assert!(!is_info_string("foo()"));
        assert!(!is_info_string("1abc"));
        assert!(!is_info_string(""));
    }

    #[test]
    fn test_bare_fence_keeps_content() {
        let text = "Here:\n```\nx = 1\ny = 2\n```";
        assert_eq!(extract_code(text), "x = 1\ny = 2");
    }

    #[test]
    fn test_unterminated_fence_keeps_tail() {
        let text = "```python\nprint('cut off')";
        assert_eq!(extract_code(text), "print('cut off')");
    }

    #[test]
    fn test_multiple_bare_blocks_last_wins() {
        let text = "```\nfirst\n```\nand\n```\nsecond\n```";
        assert_eq!(extract_code(text), "second");
    }
}
