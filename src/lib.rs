#![forbid(unsafe_code)]

//! # trendscout
//!
//! A multi-stage pipeline that discovers emerging technology trends via web
//! search, extracts and ranks candidates, evaluates each against a
//! qualification threshold, and produces an in-depth narrative report for the
//! first trend that passes.
//!
//! The core is the selection/qualification retry loop: an unordered bag of
//! search results becomes a prioritized trend queue, candidates are popped
//! one at a time and judged against a four-dimension rubric, and the loop
//! advances to the next candidate on rejection until one qualifies, the
//! queue drains, or the attempt cap is hit. Everything the loop touches is
//! fail-closed: malformed model output degrades to typed defaults, retrieval
//! failure degrades to an empty document set, and no failure below the loop
//! controller propagates as an error.

pub mod decode;
pub mod enrich;
pub mod gateway;
pub mod judge;
pub mod pipeline;
pub mod prompts;
pub mod retrieval;
pub mod selector;
pub mod state;
pub mod text;

pub use gateway::{ChatGateway, ChatModel, EmbedGateway, ProviderGateway};
pub use judge::{judge_trend, Verdict, QUALIFICATION_THRESHOLD};
pub use pipeline::{Pipeline, PipelineConfig, RunOutcome, Termination, MAX_ATTEMPTS};
pub use retrieval::{Document, SearchProvider, TavilyAdapter};
pub use selector::{QueueState, TrendQueue};
pub use state::PipelineState;
