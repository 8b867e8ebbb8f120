//! Opportunity and risk assessment for the winning trend.

use serde::Deserialize;
use tracing::{info, warn};

use crate::decode;
use crate::gateway::{ChatGateway, ChatModel, ChatRequest};
use crate::prompts::ASSESS_RISK;
use crate::state::{PipelineState, RiskAnalysis};

/// Accept both the `risk_analysis` envelope and top-level fields.
#[derive(Debug, Default, Deserialize)]
struct RiskJson {
    #[serde(default)]
    risk_analysis: Option<RiskAnalysis>,
    #[serde(flatten)]
    flat: RiskAnalysis,
}

impl RiskJson {
    fn into_risk(self) -> RiskAnalysis {
        match self.risk_analysis {
            Some(inner) => inner,
            None => self.flat,
        }
    }
}

/// Risk stage: writes `risk_analysis`, touches nothing else.
///
/// Short-circuits with a diagnostic when `current_trend` is absent or the
/// prediction is missing or empty (no summary to reason over).
pub async fn assess_risk(
    gateway: &dyn ChatGateway,
    model: &ChatModel,
    mut state: PipelineState,
) -> PipelineState {
    let Some(trend) = state.current_trend.clone() else {
        warn!("no current trend; skipping risk assessment");
        return state;
    };

    let Some(prediction) = state.trend_prediction.as_ref() else {
        warn!(trend = %trend, "no prediction; skipping risk assessment");
        return state;
    };
    if prediction.summary.trim().is_empty() {
        warn!(trend = %trend, "prediction summary is empty; skipping risk assessment");
        return state;
    }

    info!(trend = %trend, "assessing risks and opportunities");

    let prediction_json =
        serde_json::to_string_pretty(prediction).unwrap_or_else(|_| "{}".to_string());
    let prompt = ASSESS_RISK.render(&[("trend", &trend), ("prediction", &prediction_json)]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "enrich::risk")
        .temperature(0.3)
        .max_tokens(2048)
        .json();

    let raw = match gateway.chat(req).await {
        Ok(resp) => resp.content,
        Err(err) => {
            warn!(trend = %trend, code = err.code(), error = %err, "risk call failed; skipping risk assessment");
            return state;
        }
    };

    let risk = decode::decode_or_default::<RiskJson>(&raw, "enrich::risk").into_risk();
    state.risk_analysis = Some(risk);
    info!(trend = %trend, "risk assessment complete");
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enveloped_risk_is_unwrapped() {
        let raw = r#"{"risk_analysis": {"opportunities": "o", "risks": "r", "summary": "s"}}"#;
        let parsed: RiskJson = serde_json::from_str(raw).unwrap();
        let r = parsed.into_risk();
        assert_eq!(r.opportunities, "o");
        assert_eq!(r.summary, "s");
    }

    #[test]
    fn flat_risk_is_accepted() {
        let raw = r#"{"opportunities": "o", "policy_factors": "p"}"#;
        let parsed: RiskJson = serde_json::from_str(raw).unwrap();
        let r = parsed.into_risk();
        assert_eq!(r.policy_factors, "p");
    }

    #[test]
    fn malformed_risk_defaults_empty() {
        let r = decode::decode_or_default::<RiskJson>("not json", "test").into_risk();
        assert!(r.summary.is_empty());
        assert!(r.risks.is_empty());
    }
}
