//! Run orchestration: discovery → selection/qualification loop → enrichment.
//!
//! The retry loop is the heart of the system: pop a trend, judge it, and
//! either hand the winner to the enrichment pipeline or move on to the next
//! candidate. Three conditions end the loop, all of them normal termination:
//! a trend qualifies, the queue is exhausted, or the attempt cap is reached.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::gateway::{ChatGateway, ChatModel, EmbedGateway, EmbedModel};
use crate::judge::{judge_trend, Verdict};
use crate::retrieval::{discover_documents, SearchProvider};
use crate::selector::TrendQueue;
use crate::state::PipelineState;
use crate::{enrich, judge};

/// Cap on judge invocations per run, independent of queue length. Bounds
/// worst-case latency and spend against the inference service.
pub const MAX_ATTEMPTS: usize = 10;

/// Why the selection loop stopped. All variants are normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A trend passed the qualification threshold.
    Qualified,
    /// The candidate queue ran out before any trend qualified.
    Exhausted,
    /// The attempt cap was reached with candidates still remaining.
    AttemptCapReached,
}

/// Result of one full pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
    pub termination: Termination,
    /// Judge invocations performed.
    pub attempts: usize,
    pub state: PipelineState,
}

impl RunOutcome {
    pub fn qualified_trend(&self) -> Option<&str> {
        match self.termination {
            Termination::Qualified => self.state.current_trend.as_deref(),
            _ => None,
        }
    }
}

/// Pipeline configuration, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model: ChatModel,
    pub embed_model: EmbedModel,
    pub max_attempts: usize,
    pub max_results_per_query: usize,
    pub out_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: ChatModel::default(),
            embed_model: EmbedModel::default(),
            max_attempts: MAX_ATTEMPTS,
            max_results_per_query: 5,
            out_dir: PathBuf::from("reports"),
        }
    }
}

/// The assembled pipeline. Collaborators are injected; their lifecycle is
/// owned by the process entry point, not by the stages.
pub struct Pipeline {
    chat: Arc<dyn ChatGateway>,
    embed: Arc<dyn EmbedGateway>,
    search: Arc<dyn SearchProvider>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        chat: Arc<dyn ChatGateway>,
        embed: Arc<dyn EmbedGateway>,
        search: Arc<dyn SearchProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            chat,
            embed,
            search,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline: discovery, the qualification loop, and (for a
    /// qualifying trend) the enrichment stages.
    pub async fn run(&self) -> RunOutcome {
        let documents =
            discover_documents(self.search.as_ref(), self.config.max_results_per_query).await;
        let state = PipelineState::with_search_results(documents);
        self.run_from_state(state).await
    }

    /// Run from pre-collected search results. Used by tests and by callers
    /// that source documents elsewhere.
    pub async fn run_from_state(&self, state: PipelineState) -> RunOutcome {
        let mut queue = TrendQueue::new();
        let mut outcome = self.run_selection_loop(state, &mut queue).await;

        if outcome.termination == Termination::Qualified {
            outcome.state = self.run_enrichment(outcome.state).await;
        } else {
            info!(termination = ?outcome.termination, "no qualifying trend found");
        }

        outcome
    }

    /// The retry loop: pop → judge → qualified? stop : next.
    ///
    /// Each candidate reaches the judge at most once; nothing is re-popped.
    pub async fn run_selection_loop(
        &self,
        mut state: PipelineState,
        queue: &mut TrendQueue,
    ) -> RunOutcome {
        let mut attempts = 0;

        while attempts < self.config.max_attempts {
            let selected = queue
                .select_next(self.chat.as_ref(), &self.config.model, &state.search_results)
                .await;

            let Some(trend) = selected else {
                info!(attempts, "trend queue exhausted");
                state.current_trend = None;
                return RunOutcome {
                    termination: Termination::Exhausted,
                    attempts,
                    state,
                };
            };

            state.current_trend = Some(trend.clone());
            attempts += 1;

            let verdict = judge_trend(self.chat.as_ref(), &self.config.model, &trend).await;
            apply_verdict(&mut state, &verdict);

            if verdict.is_qualified {
                info!(trend = %trend, attempts, "trend qualified");
                return RunOutcome {
                    termination: Termination::Qualified,
                    attempts,
                    state,
                };
            }
            info!(trend = %trend, attempts, "trend rejected; moving to next candidate");
        }

        info!(attempts, "attempt cap reached");
        RunOutcome {
            termination: Termination::AttemptCapReached,
            attempts,
            state,
        }
    }

    /// The once-per-run enrichment chain.
    async fn run_enrichment(&self, state: PipelineState) -> PipelineState {
        let state = enrich::analyze_trend(
            self.chat.as_ref(),
            self.embed.as_ref(),
            self.search.as_ref(),
            &self.config.model,
            self.config.embed_model,
            state,
        )
        .await;
        let state = enrich::predict_trend(self.chat.as_ref(), &self.config.model, state).await;
        let state = enrich::assess_risk(self.chat.as_ref(), &self.config.model, state).await;
        enrich::compose_report(
            self.chat.as_ref(),
            &self.config.model,
            &self.config.out_dir,
            state,
        )
        .await
    }
}

/// Record the judge's verdict in the state. Writes only judge-owned fields.
fn apply_verdict(state: &mut PipelineState, verdict: &Verdict) {
    state.scores = Some(verdict.scores);
    state.total_score = Some(verdict.total_score);
    state.is_qualified = Some(verdict.is_qualified);
    state.reason = Some(verdict.reason.clone());
}
