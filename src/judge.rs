//! Qualification judge: scores one trend against the four-dimension rubric.

use serde::Deserialize;
use tracing::{info, warn};

use crate::decode;
use crate::gateway::{ChatGateway, ChatModel, ChatRequest};
use crate::prompts::JUDGE_TREND;
use crate::state::Scores;

/// A trend qualifies when the mean of the four rubric scores reaches this.
pub const QUALIFICATION_THRESHOLD: f64 = 0.65;

/// The judge's output for one trend.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub trend: String,
    pub scores: Scores,
    pub total_score: f64,
    pub is_qualified: bool,
    pub reason: String,
}

impl Verdict {
    /// The fail-closed verdict: all-zero scores, unqualified.
    pub fn unqualified(trend: &str, reason: impl Into<String>) -> Self {
        Self {
            trend: trend.to_string(),
            scores: Scores::default(),
            total_score: 0.0,
            is_qualified: false,
            reason: reason.into(),
        }
    }
}

/// Raw JSON structure from the judge response.
///
/// The model also asserts `total_score` and `is_qualified`; both are parsed
/// and ignored — the verdict is recomputed locally from the sub-scores.
#[derive(Debug, Default, Deserialize)]
struct JudgeJson {
    #[serde(default)]
    scores: Option<Scores>,
    #[serde(default)]
    reason: String,
}

/// Compute the verdict from sub-scores: clamp into [0, 1], take the mean,
/// compare against the threshold.
pub fn verdict_from_scores(trend: &str, scores: Scores, reason: String) -> Verdict {
    let scores = Scores {
        maturity: scores.maturity.clamp(0.0, 1.0),
        growth: scores.growth.clamp(0.0, 1.0),
        applicability: scores.applicability.clamp(0.0, 1.0),
        innovation: scores.innovation.clamp(0.0, 1.0),
    };
    let total_score = scores.mean();
    Verdict {
        trend: trend.to_string(),
        scores,
        total_score,
        is_qualified: total_score >= QUALIFICATION_THRESHOLD,
        reason,
    }
}

/// Judge a single trend. Infallible: provider or parse failure yields the
/// fail-closed verdict, never an error.
///
/// Repeat calls on the same trend are not guaranteed the same verdict; the
/// inference service is not deterministic.
pub async fn judge_trend(gateway: &dyn ChatGateway, model: &ChatModel, trend: &str) -> Verdict {
    info!(trend = %trend, "judging trend");

    let prompt = JUDGE_TREND.render(&[("trend", trend)]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "judge::score")
        .temperature(0.1)
        .max_tokens(1024)
        .json();

    let raw = match gateway.chat(req).await {
        Ok(resp) => resp.content,
        Err(err) => {
            warn!(trend = %trend, code = err.code(), error = %err, "judge call failed; unqualified");
            return Verdict::unqualified(trend, "inference call failed");
        }
    };

    let verdict = match decode::decode::<JudgeJson>(&raw) {
        Ok(JudgeJson {
            scores: Some(scores),
            reason,
        }) => verdict_from_scores(trend, scores, reason),
        Ok(JudgeJson { scores: None, .. }) => {
            warn!(trend = %trend, "judge response missing scores; unqualified");
            Verdict::unqualified(trend, "judge response missing scores")
        }
        Err(err) => {
            warn!(trend = %trend, error = %err, "judge JSON parse failed; unqualified");
            Verdict::unqualified(trend, "judge response parse failed")
        }
    };

    info!(
        trend = %trend,
        maturity = verdict.scores.maturity,
        growth = verdict.scores.growth,
        applicability = verdict.scores.applicability,
        innovation = verdict.scores.innovation,
        total = verdict.total_score,
        qualified = verdict.is_qualified,
        "qualification verdict"
    );
    verdict
}
