//! Forward prediction for the winning trend.

use serde::Deserialize;
use tracing::{info, warn};

use crate::decode;
use crate::gateway::{ChatGateway, ChatModel, ChatRequest};
use crate::prompts::PREDICT_TREND;
use crate::state::{PipelineState, TrendPrediction};

use super::analysis::analysis_context;

/// Models sometimes wrap the payload in a `prediction` envelope and sometimes
/// emit the fields at top level; accept both.
#[derive(Debug, Default, Deserialize)]
struct PredictionJson {
    #[serde(default)]
    prediction: Option<TrendPrediction>,
    #[serde(flatten)]
    flat: TrendPrediction,
}

impl PredictionJson {
    fn into_prediction(self) -> TrendPrediction {
        match self.prediction {
            Some(inner) if !inner.summary.trim().is_empty() => inner,
            Some(inner) if self.flat.summary.trim().is_empty() => inner,
            _ => self.flat,
        }
    }
}

/// Prediction stage: writes `trend_prediction`, touches nothing else.
///
/// Short-circuits with a diagnostic when `current_trend` or `trend_analysis`
/// is absent.
pub async fn predict_trend(
    gateway: &dyn ChatGateway,
    model: &ChatModel,
    mut state: PipelineState,
) -> PipelineState {
    let (Some(trend), Some(analysis)) = (state.current_trend.clone(), state.trend_analysis.as_ref())
    else {
        warn!("missing trend or analysis; skipping prediction");
        return state;
    };

    info!(trend = %trend, "predicting trend trajectory");

    let context = analysis_context(&trend, analysis);
    let prompt = PREDICT_TREND.render(&[("trend", &trend), ("context", &context)]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "enrich::predict")
        .temperature(0.3)
        .max_tokens(2048)
        .json();

    let raw = match gateway.chat(req).await {
        Ok(resp) => resp.content,
        Err(err) => {
            warn!(trend = %trend, code = err.code(), error = %err, "prediction call failed; skipping prediction");
            return state;
        }
    };

    let prediction = decode::decode_or_default::<PredictionJson>(&raw, "enrich::predict")
        .into_prediction();
    if prediction.summary.trim().is_empty() {
        warn!(trend = %trend, "prediction has no summary; downstream stages will skip");
    }

    state.trend_prediction = Some(prediction);
    info!(trend = %trend, "trend prediction complete");
    state
}
