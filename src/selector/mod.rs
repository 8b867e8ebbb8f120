//! Trend selection: the ordered queue of candidates and its pop discipline.
//!
//! The queue is the only stateful structure in the run. It initializes at
//! most once (extraction + ranking), then only shrinks, one front pop per
//! selection, until exhausted. Not safe for concurrent callers; a run is a
//! single logical thread of control.

pub mod extract;
pub mod rank;

use std::collections::VecDeque;

use tracing::info;

use crate::gateway::{ChatGateway, ChatModel};
use crate::retrieval::Document;

pub use extract::extract_candidates;
pub use rank::rank_by_future_relevance;

/// Queue lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Not yet initialized; extraction and ranking have not run.
    Empty,
    /// Initialized with at least one candidate still remaining.
    Ready,
    /// Initialized and drained. Terminal for the run.
    Exhausted,
}

/// The ordered, mutable list of remaining trend candidates.
#[derive(Debug)]
pub struct TrendQueue {
    remaining: VecDeque<String>,
    state: QueueState,
}

impl Default for TrendQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendQueue {
    pub fn new() -> Self {
        Self {
            remaining: VecDeque::new(),
            state: QueueState::Empty,
        }
    }

    /// Build an already-initialized queue from a ranked candidate list.
    pub fn from_ranked(candidates: Vec<String>) -> Self {
        let remaining: VecDeque<String> = candidates.into();
        let state = if remaining.is_empty() {
            QueueState::Exhausted
        } else {
            QueueState::Ready
        };
        Self { remaining, state }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.state != QueueState::Empty
    }

    /// Initialize from documents if not yet initialized.
    ///
    /// Runs extraction and ranking at most once per run. Invoking again while
    /// `Ready` or `Exhausted` is a no-op. Invoking with no documents while
    /// `Empty` leaves the queue uninitialized.
    pub async fn initialize_if_empty(
        &mut self,
        gateway: &dyn ChatGateway,
        model: &ChatModel,
        docs: &[Document],
    ) {
        if self.state != QueueState::Empty {
            return;
        }
        if docs.is_empty() {
            info!("no search results; queue stays uninitialized");
            return;
        }

        info!("building trend candidate queue");
        let candidates = extract_candidates(gateway, model, docs).await;
        let ranked = rank_by_future_relevance(gateway, model, &candidates).await;
        info!(queue = ?ranked, "ranked trend queue");

        self.remaining = ranked.into();
        self.state = if self.remaining.is_empty() {
            QueueState::Exhausted
        } else {
            QueueState::Ready
        };
    }

    /// Remove and return the front candidate.
    ///
    /// Returns `None` once exhausted (or never initialized). The queue
    /// strictly shrinks by one per successful pop; nothing is ever
    /// re-inserted.
    pub fn pop(&mut self) -> Option<String> {
        if self.state != QueueState::Ready {
            return None;
        }

        let current = self.remaining.pop_front();
        if self.remaining.is_empty() {
            self.state = QueueState::Exhausted;
        }
        if let Some(trend) = &current {
            info!(trend = %trend, remaining = self.remaining.len(), "selected next trend");
        }
        current
    }

    /// Initialize if needed, then pop the next candidate.
    ///
    /// This is the selector operation the retry loop drives: `None` means
    /// "no trend available" — either no documents, no surviving candidates,
    /// or a drained queue.
    pub async fn select_next(
        &mut self,
        gateway: &dyn ChatGateway,
        model: &ChatModel,
        docs: &[Document],
    ) -> Option<String> {
        self.initialize_if_empty(gateway, model, docs).await;
        self.pop()
    }
}
