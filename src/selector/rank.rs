//! Future-relevance ranking of trend candidates.

use serde::Deserialize;
use tracing::{info, warn};

use crate::decode;
use crate::gateway::{ChatGateway, ChatModel, ChatRequest};
use crate::prompts::RANK_CANDIDATES;
use crate::state::RankedTrend;

/// Raw JSON structure from the ranking response.
#[derive(Debug, Default, Deserialize)]
struct RankedListJson {
    #[serde(default)]
    ranked_trends: Vec<RankedTrend>,
}

/// Rank candidates by future relevance, most relevant first.
///
/// The sort happens here, descending by `total`, stable so ties keep input
/// order — the service's own ordering is never trusted. On parse failure or
/// an empty ranked list the input sequence is returned unchanged: ranking
/// degradation must never reduce the candidate count.
pub async fn rank_by_future_relevance(
    gateway: &dyn ChatGateway,
    model: &ChatModel,
    candidates: &[String],
) -> Vec<String> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let trend_list = candidates.join("\n");
    let prompt = RANK_CANDIDATES.render(&[("trend_list", &trend_list)]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "selector::rank")
        .temperature(0.2)
        .max_tokens(2048)
        .json();

    let raw = match gateway.chat(req).await {
        Ok(resp) => resp.content,
        Err(err) => {
            warn!(code = err.code(), error = %err, "ranking call failed; keeping input order");
            return candidates.to_vec();
        }
    };

    let ranked_data = match decode::decode::<RankedListJson>(&raw) {
        Ok(parsed) if !parsed.ranked_trends.is_empty() => parsed.ranked_trends,
        Ok(_) => {
            warn!("ranking returned an empty list; keeping input order");
            return candidates.to_vec();
        }
        Err(err) => {
            warn!(error = %err, "ranking JSON parse failed; keeping input order");
            return candidates.to_vec();
        }
    };

    let ordered = order_by_total(ranked_data, candidates);
    info!(count = ordered.len(), "ranked trend candidates");
    ordered
}

/// Sort descending by total (stable), then re-attach any input candidate the
/// service dropped so the count is preserved.
fn order_by_total(mut ranked: Vec<RankedTrend>, candidates: &[String]) -> Vec<String> {
    ranked.retain(|r| !r.name.trim().is_empty());
    // Stable sort: ties keep input order.
    ranked.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ordered: Vec<String> = ranked.into_iter().map(|r| r.name.trim().to_string()).collect();

    for candidate in candidates {
        let known = ordered
            .iter()
            .any(|name| name.eq_ignore_ascii_case(candidate));
        if !known {
            warn!(candidate = %candidate, "candidate missing from ranking; appending at tail");
            ordered.push(candidate.clone());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RelevanceScores;

    fn entry(name: &str, total: f64) -> RankedTrend {
        RankedTrend {
            name: name.to_string(),
            scores: RelevanceScores::default(),
            total,
            reason: String::new(),
        }
    }

    #[test]
    fn sorts_descending_by_total() {
        let candidates = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let ranked = vec![entry("A", 1.2), entry("B", 2.55), entry("C", 1.9)];
        let ordered = order_by_total(ranked, &candidates);
        assert_eq!(ordered, vec!["B", "C", "A"]);
    }

    #[test]
    fn high_scoring_candidate_ranks_first() {
        // emergence 0.9 + growth 0.8 + applicability 0.85
        let candidates = vec!["Neuromorphic AI".to_string(), "Other".to_string()];
        let ranked = vec![entry("Other", 1.5), entry("Neuromorphic AI", 2.55)];
        let ordered = order_by_total(ranked, &candidates);
        assert_eq!(ordered[0], "Neuromorphic AI");
    }

    #[test]
    fn ties_keep_input_order() {
        let candidates = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let ranked = vec![entry("A", 1.0), entry("B", 1.0), entry("C", 1.0)];
        let ordered = order_by_total(ranked, &candidates);
        assert_eq!(ordered, vec!["A", "B", "C"]);
    }

    #[test]
    fn dropped_candidates_are_reattached() {
        let candidates = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let ranked = vec![entry("C", 2.0)];
        let ordered = order_by_total(ranked, &candidates);
        assert_eq!(ordered, vec!["C", "A", "B"]);
        assert_eq!(ordered.len(), candidates.len());
    }
}
