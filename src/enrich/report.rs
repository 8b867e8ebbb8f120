//! Final report composition and rendering.
//!
//! The only stage with a filesystem effect beyond logging: it composes the
//! narrative report and writes it to `<out_dir>/<slug>_report.md`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::gateway::{ChatGateway, ChatModel, ChatRequest};
use crate::prompts::COMPOSE_REPORT;
use crate::state::{FinalReport, PipelineState};
use crate::text::slugify;

/// Output path for a trend's report under the output directory.
pub fn report_path(out_dir: &Path, trend: &str) -> PathBuf {
    out_dir.join(format!("{}_report.md", slugify(trend)))
}

/// Render the on-disk document around the composed report text.
pub fn render_document(trend: &str, report_text: &str) -> String {
    format!("# AI Trend Report: {trend}\n\n{report_text}\n")
}

/// Report stage: writes `final_report` and the report file, touches nothing
/// else. Short-circuits with a diagnostic when `current_trend` is absent.
/// Missing upstream analyses degrade to empty sections, not a skipped report.
pub async fn compose_report(
    gateway: &dyn ChatGateway,
    model: &ChatModel,
    out_dir: &Path,
    mut state: PipelineState,
) -> PipelineState {
    let Some(trend) = state.current_trend.clone() else {
        warn!("no current trend; skipping report");
        return state;
    };

    info!(trend = %trend, "composing final report");

    let analysis = state
        .trend_analysis
        .as_ref()
        .and_then(|a| serde_json::to_string_pretty(a).ok())
        .unwrap_or_else(|| "{}".to_string());
    let prediction = state
        .trend_prediction
        .as_ref()
        .and_then(|p| serde_json::to_string_pretty(p).ok())
        .unwrap_or_else(|| "{}".to_string());
    let risk = state
        .risk_analysis
        .as_ref()
        .and_then(|r| serde_json::to_string_pretty(r).ok())
        .unwrap_or_else(|| "{}".to_string());
    let references = serde_json::to_string(
        &state
            .search_results
            .iter()
            .map(|d| d.url.as_str())
            .filter(|u| !u.is_empty() && *u != "N/A")
            .collect::<Vec<_>>(),
    )
    .unwrap_or_else(|_| "[]".to_string());

    let prompt = COMPOSE_REPORT.render(&[
        ("trend", &trend),
        ("analysis", &analysis),
        ("prediction", &prediction),
        ("risk", &risk),
        ("references", &references),
    ]);
    let req = ChatRequest::new(model.clone(), prompt.to_messages(), "enrich::report")
        .temperature(0.4)
        .max_tokens(8192);

    let report_text = match gateway.chat(req).await {
        Ok(resp) => resp.content.trim().to_string(),
        Err(err) => {
            warn!(trend = %trend, code = err.code(), error = %err, "report call failed; skipping report");
            return state;
        }
    };

    let path = report_path(out_dir, &trend);
    if let Err(err) = fs::create_dir_all(out_dir) {
        warn!(dir = %out_dir.display(), error = %err, "cannot create output directory; report not written");
        return state;
    }
    if let Err(err) = fs::write(&path, render_document(&trend, &report_text)) {
        warn!(path = %path.display(), error = %err, "report write failed; report not persisted");
        return state;
    }

    info!(trend = %trend, path = %path.display(), "report written");
    state.final_report = Some(FinalReport {
        trend,
        report_text,
        output_path: path.display().to_string(),
    });
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_uses_slug() {
        let path = report_path(Path::new("reports"), "Federated Learning");
        assert_eq!(path, PathBuf::from("reports/Federated_Learning_report.md"));
    }

    #[test]
    fn rendered_document_has_title_and_body() {
        let doc = render_document("Synthetic Data", "Body text.");
        assert!(doc.starts_with("# AI Trend Report: Synthetic Data"));
        assert!(doc.contains("Body text."));
    }
}
