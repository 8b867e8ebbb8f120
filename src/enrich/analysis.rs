//! Retrieval-augmented analysis of the winning trend.
//!
//! One fresh document search, one embedding pass, then one generation call
//! per analysis facet grounded in the top-k nearest documents. No internal
//! state machine; a function from (trend, documents) to structured text.

use serde_json::json;
use tracing::{info, warn};

use crate::gateway::{
    ChatGateway, ChatModel, ChatRequest, EmbedGateway, EmbedModel, EmbedRequest,
};
use crate::prompts::ANALYZE_FACET;
use crate::retrieval::{site_filter, SearchProvider};
use crate::state::{PipelineState, TrendAnalysis};
use crate::text::clean_text;

/// Domains the analysis search is restricted to.
pub const ANALYSIS_DOMAINS: &[&str] = &[
    "nature.com",
    "arxiv.org",
    "mit.edu",
    "stanford.edu",
    "mckinsey.com",
    "weforum.org",
    "unctad.org",
    "nvidia.com",
    "microsoft.com/en-us/research",
    "deepmind.google",
];

/// Content kept per analysis document (longer than discovery excerpts).
const ANALYSIS_EXCERPT_CHARS: usize = 1_000;

/// Documents retrieved per facet question.
const TOP_K: usize = 5;

/// The analysis facets, in generation order. Order is insensitive; each facet
/// call is independent.
const FACETS: &[(&str, fn(&str) -> String)] = &[
    ("definition", |t| format!("What is {t} and why is it emerging?")),
    ("key_technologies", |t| {
        format!("What are the core technologies or research areas driving {t}?")
    }),
    ("industry_trends", |t| {
        format!("Which industries are adopting {t}, and what are the notable use cases?")
    }),
    ("adoption_flow", |t| {
        format!("What stages of adoption are industries currently in for {t}?")
    }),
    ("future_outlook", |t| {
        format!("What is the expected evolution or market forecast for {t} by 2030?")
    }),
];

// =============================================================================
// In-memory vector index
// =============================================================================

/// Embedded documents with cosine nearest-neighbor lookup.
pub struct VectorIndex {
    entries: Vec<(Vec<f32>, String)>,
}

impl VectorIndex {
    pub fn new(embeddings: Vec<Vec<f32>>, texts: Vec<String>) -> Self {
        let entries = embeddings.into_iter().zip(texts).collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` stored texts most similar to the query vector, best first.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<&str> {
        let mut scored: Vec<(f64, &str)> = self
            .entries
            .iter()
            .map(|(vec, text)| (cosine_similarity(query, vec), text.as_str()))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, text)| text).collect()
    }
}

/// Cosine similarity of two vectors; 0.0 for mismatched or zero-norm input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

// =============================================================================
// Stage
// =============================================================================

/// Analysis stage: writes `trend_analysis`, touches nothing else.
///
/// Short-circuits with a diagnostic when `current_trend` is absent or no
/// usable documents can be collected.
pub async fn analyze_trend(
    chat: &dyn ChatGateway,
    embed: &dyn EmbedGateway,
    search: &dyn SearchProvider,
    model: &ChatModel,
    embed_model: EmbedModel,
    mut state: PipelineState,
) -> PipelineState {
    let Some(trend) = state.current_trend.clone() else {
        warn!("no current trend; skipping analysis");
        return state;
    };

    info!(trend = %trend, "starting trend analysis");

    let filter = site_filter(ANALYSIS_DOMAINS);
    let query = format!(
        "({trend} technology trends 2026 OR industrial applications OR challenges OR market forecast) AND ({filter})"
    );

    let docs = match search.search(&query, 20).await {
        Ok(docs) => docs,
        Err(err) => {
            warn!(code = err.code(), error = %err, "analysis search failed; skipping analysis");
            return state;
        }
    };

    let texts: Vec<String> = docs
        .iter()
        .map(|d| clean_text(&d.content.chars().take(ANALYSIS_EXCERPT_CHARS).collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        warn!(trend = %trend, "no usable analysis documents; skipping analysis");
        return state;
    }
    info!(count = texts.len(), "collected analysis documents");

    let embed_req = EmbedRequest::new(embed_model, texts.clone(), "enrich::analysis");
    let index = match embed.embed(embed_req).await {
        Ok(resp) => VectorIndex::new(resp.embeddings, texts),
        Err(err) => {
            warn!(code = err.code(), error = %err, "document embedding failed; skipping analysis");
            return state;
        }
    };

    let mut analysis = TrendAnalysis {
        doc_count: index.len(),
        ..TrendAnalysis::default()
    };

    for (topic, question_for) in FACETS {
        let question = question_for(&trend);
        let text = analyze_facet(chat, embed, &index, model, embed_model, &trend, topic, &question)
            .await;
        match *topic {
            "definition" => analysis.definition = text,
            "key_technologies" => analysis.key_technologies = text,
            "industry_trends" => analysis.industry_trends = text,
            "adoption_flow" => analysis.adoption_flow = text,
            "future_outlook" => analysis.future_outlook = text,
            _ => unreachable!("unknown facet"),
        }
        info!(trend = %trend, facet = topic, "facet analysis complete");
    }

    state.trend_analysis = Some(analysis);
    info!(trend = %trend, docs = index.len(), "trend analysis complete");
    state
}

/// One facet: retrieve top-k grounding documents, generate the analysis text.
/// Failures degrade to an empty facet rather than aborting the stage.
#[allow(clippy::too_many_arguments)]
async fn analyze_facet(
    chat: &dyn ChatGateway,
    embed: &dyn EmbedGateway,
    index: &VectorIndex,
    model: &ChatModel,
    embed_model: EmbedModel,
    trend: &str,
    topic: &str,
    question: &str,
) -> String {
    let query_req = EmbedRequest::new(embed_model, vec![question.to_string()], "enrich::analysis");
    let query_vec = match embed.embed(query_req).await {
        Ok(mut resp) if !resp.embeddings.is_empty() => resp.embeddings.remove(0),
        Ok(_) => {
            warn!(facet = topic, "empty query embedding; facet skipped");
            return String::new();
        }
        Err(err) => {
            warn!(facet = topic, code = err.code(), error = %err, "query embedding failed; facet skipped");
            return String::new();
        }
    };

    let context = index.top_k(&query_vec, TOP_K).join("\n\n");
    let prompt = ANALYZE_FACET.render(&[("trend", trend), ("topic", topic), ("context", &context)]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "enrich::analysis")
        .temperature(0.3)
        .max_tokens(2048);

    match chat.chat(req).await {
        Ok(resp) => resp.content.trim().to_string(),
        Err(err) => {
            warn!(facet = topic, code = err.code(), error = %err, "facet generation failed; facet skipped");
            String::new()
        }
    }
}

/// Serialize an analysis for downstream prompt context.
pub fn analysis_context(trend: &str, analysis: &TrendAnalysis) -> String {
    json!({
        "trend": trend,
        "definition": analysis.definition,
        "key_technologies": analysis.key_technologies,
        "industry_trends": analysis.industry_trends,
        "adoption_flow": analysis.adoption_flow,
        "future_outlook": analysis.future_outlook,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    }

    #[test]
    fn cosine_handles_degenerate_input() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn top_k_returns_most_similar_first() {
        let index = VectorIndex::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]],
            vec!["x-axis".into(), "y-axis".into(), "near-x".into()],
        );
        let hits = index.top_k(&[1.0, 0.0], 2);
        assert_eq!(hits, vec!["x-axis", "near-x"]);
    }

    #[test]
    fn top_k_caps_at_index_size() {
        let index = VectorIndex::new(vec![vec![1.0]], vec!["only".into()]);
        assert_eq!(index.top_k(&[1.0], 5).len(), 1);
    }
}
