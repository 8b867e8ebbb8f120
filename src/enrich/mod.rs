//! Enrichment pipeline: analysis → prediction → risk → report.
//!
//! Runs exactly once, only for the trend that passes the judge. Every stage
//! is a function `PipelineState -> PipelineState` that reads its upstream
//! fields, writes exactly one new field, and short-circuits (state unchanged
//! plus a diagnostic) when a required upstream field is absent. Partial
//! failure propagates forward without crashing the run.

pub mod analysis;
pub mod predict;
pub mod report;
pub mod risk;

pub use analysis::{analyze_trend, VectorIndex};
pub use predict::predict_trend;
pub use report::compose_report;
pub use risk::assess_risk;
