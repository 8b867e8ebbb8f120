//! Candidate extraction: raw documents → deduplicated trend candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::decode;
use crate::gateway::{ChatGateway, ChatModel, ChatRequest};
use crate::prompts::EXTRACT_CANDIDATES;
use crate::retrieval::Document;
use crate::text::clean_text;

/// Raw JSON structure from the extraction response.
#[derive(Debug, Default, Deserialize)]
struct CandidatesJson {
    #[serde(default)]
    candidates: Vec<String>,
}

/// Capitalized phrases ending in "AI" (e.g. "Neuromorphic AI"), the
/// last-resort scan when the model ignores the JSON format. Requires at least
/// one capitalized word before the "AI" token so prose does not match.
static CANDIDATE_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:[A-Z][A-Za-z0-9\-]*\s+)+AI\b").expect("valid regex"));

/// Extract trend candidates from a document set.
///
/// Concatenates cleaned document text, asks for a JSON candidate list, and
/// falls back to a regex scan of the raw response when parsing fails. An
/// empty result propagates as "no candidates"; this function never errors.
pub async fn extract_candidates(
    gateway: &dyn ChatGateway,
    model: &ChatModel,
    docs: &[Document],
) -> Vec<String> {
    if docs.is_empty() {
        return Vec::new();
    }

    let combined_text = docs
        .iter()
        .map(|d| clean_text(&d.content))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = EXTRACT_CANDIDATES.render(&[("content", &combined_text)]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "selector::extract")
        .temperature(0.2)
        .max_tokens(1024)
        .json();

    let raw = match gateway.chat(req).await {
        Ok(resp) => resp.content,
        Err(err) => {
            warn!(code = err.code(), error = %err, "candidate extraction call failed; no candidates");
            return Vec::new();
        }
    };

    let candidates = match decode::decode::<CandidatesJson>(&raw) {
        Ok(parsed) => parsed.candidates,
        Err(err) => {
            warn!(error = %err, "candidate JSON parse failed; scanning raw text");
            fallback_scan(&raw)
        }
    };

    let deduped = dedup_candidates(candidates);
    info!(count = deduped.len(), "extracted trend candidates");
    deduped
}

/// Regex fallback over the raw response text.
pub fn fallback_scan(raw: &str) -> Vec<String> {
    CANDIDATE_PHRASE
        .find_iter(raw)
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Drop duplicates case-insensitively, keeping first occurrence order.
pub fn dedup_candidates(candidates: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.to_lowercase()))
        .collect()
}
