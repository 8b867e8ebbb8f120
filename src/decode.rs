//! Robust structured decoding of LLM output.
//!
//! Models return JSON wrapped in code fences, embedded in prose, or outright
//! malformed. Every stage that parses model output goes through this module:
//! strip fences, attempt a full parse, attempt a brace-bounded substring
//! parse, then fall back to a typed default. Malformed text never escapes a
//! component boundary.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Strip leading/trailing markdown code fences, including a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line ("json", "JSON", ...), if any.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Extract a JSON object from potentially noisy output.
///
/// Handles pure JSON, fenced JSON, and JSON embedded in prose. Returns the
/// input unchanged if no balanced object is found.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = strip_code_fences(raw);

    if trimmed.starts_with('{') {
        if let Some(end) = find_matching_brace(trimmed) {
            return &trimmed[..end];
        }
    }

    if let Some(start) = trimmed.find('{') {
        let remainder = &trimmed[start..];
        if let Some(end) = find_matching_brace(remainder) {
            return &remainder[..end];
        }
    }

    trimmed
}

/// Byte offset just past the matching closing brace, respecting JSON strings
/// so braces inside `"..."` are not counted.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if c == '\\' && in_string {
            escape = true;
            continue;
        }
        if c == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode a typed value from noisy model output.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json(raw))
}

/// Decode a typed value, falling back to `T::default()` on any parse failure.
///
/// `stage` names the caller for the degradation log line.
pub fn decode_or_default<T: DeserializeOwned + Default>(raw: &str, stage: &str) -> T {
    match decode(raw) {
        Ok(value) => value,
        Err(err) => {
            let preview: String = raw.chars().take(200).collect();
            warn!(stage, error = %err, preview = %preview, "structured decode failed; using typed default");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Candidates {
        #[serde(default)]
        candidates: Vec<String>,
    }

    #[test]
    fn pure_json_passes_through() {
        let input = r#"{"candidates": ["Neuromorphic AI"]}"#;
        assert_eq!(extract_json(input), input);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let input = "```json\n{\"candidates\": [\"Synthetic Data\"]}\n```";
        let parsed: Candidates = decode(input).unwrap();
        assert_eq!(parsed.candidates, vec!["Synthetic Data"]);
    }

    #[test]
    fn fence_without_language_tag() {
        let input = "```\n{\"candidates\": []}\n```";
        let parsed: Candidates = decode(input).unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn json_embedded_in_prose() {
        let input = "Here is the list:\n{\"candidates\": [\"Agentic AI\"]}\nHope that helps.";
        let parsed: Candidates = decode(input).unwrap();
        assert_eq!(parsed.candidates, vec!["Agentic AI"]);
    }

    #[test]
    fn braces_inside_strings_do_not_truncate() {
        let input = r#"result: {"candidates": ["a {weird} name"]} done"#;
        assert_eq!(extract_json(input), r#"{"candidates": ["a {weird} name"]}"#);
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let input = r#"{"candidates": ["say \"hi\""]}"#;
        assert_eq!(extract_json(input), input);
    }

    #[test]
    fn malformed_yields_default() {
        let parsed: Candidates = decode_or_default("not json at all", "test");
        assert_eq!(parsed, Candidates::default());
    }

    #[test]
    fn truncated_json_yields_default() {
        let parsed: Candidates = decode_or_default(r#"{"candidates": ["Neuro"#, "test");
        assert_eq!(parsed, Candidates::default());
    }
}
