//! The pipeline state record and the structured results each stage writes.
//!
//! One explicit struct replaces the dict-by-convention state of ad-hoc agent
//! pipelines: every stage reads the fields it needs and writes only the
//! fields it owns, so no stage can silently drop another stage's output.

use serde::{Deserialize, Serialize};

use crate::retrieval::Document;

// =============================================================================
// Stage results
// =============================================================================

/// Relevance scores assigned by the ranker, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RelevanceScores {
    #[serde(default)]
    pub emergence: f64,
    #[serde(default)]
    pub growth: f64,
    #[serde(default)]
    pub applicability: f64,
}

/// One entry in the ranker output. Ordering key is `total`, descending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedTrend {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scores: RelevanceScores,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub reason: String,
}

/// Qualification rubric scores, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Scores {
    #[serde(default)]
    pub maturity: f64,
    #[serde(default)]
    pub growth: f64,
    #[serde(default)]
    pub applicability: f64,
    #[serde(default)]
    pub innovation: f64,
}

impl Scores {
    /// Arithmetic mean of the four rubric dimensions.
    pub fn mean(&self) -> f64 {
        (self.maturity + self.growth + self.applicability + self.innovation) / 4.0
    }
}

/// Retrieval-augmented facet analysis of the winning trend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendAnalysis {
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub key_technologies: String,
    #[serde(default)]
    pub industry_trends: String,
    #[serde(default)]
    pub adoption_flow: String,
    #[serde(default)]
    pub future_outlook: String,
    /// How many documents grounded the analysis.
    #[serde(default)]
    pub doc_count: usize,
}

/// Forward-looking prediction for the winning trend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendPrediction {
    #[serde(default)]
    pub tech_path: String,
    #[serde(default)]
    pub market_outlook: String,
    #[serde(default)]
    pub industry_applications: String,
    #[serde(default)]
    pub barriers: String,
    #[serde(default)]
    pub summary: String,
}

/// Opportunity/risk assessment for the winning trend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskAnalysis {
    #[serde(default)]
    pub opportunities: String,
    #[serde(default)]
    pub risks: String,
    #[serde(default)]
    pub policy_factors: String,
    #[serde(default)]
    pub strategic_response: String,
    #[serde(default)]
    pub summary: String,
}

/// Terminal output of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub trend: String,
    pub report_text: String,
    pub output_path: String,
}

// =============================================================================
// Pipeline state
// =============================================================================

/// The aggregate record threaded through every stage of one run.
///
/// Fields are additive: stages set their own fields and leave the rest
/// untouched. Created empty at process start, discarded at process exit.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Discovery search results. Written once by the search stage.
    pub search_results: Vec<Document>,
    /// Trend under active evaluation. Set by the selector's pop; `None` once
    /// the queue is exhausted.
    pub current_trend: Option<String>,
    /// Rubric sub-scores from the judge.
    pub scores: Option<Scores>,
    /// Mean of the rubric sub-scores.
    pub total_score: Option<f64>,
    /// Locally recomputed qualification verdict.
    pub is_qualified: Option<bool>,
    /// Judge's human-readable reasoning.
    pub reason: Option<String>,
    pub trend_analysis: Option<TrendAnalysis>,
    pub trend_prediction: Option<TrendPrediction>,
    pub risk_analysis: Option<RiskAnalysis>,
    pub final_report: Option<FinalReport>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_results(search_results: Vec<Document>) -> Self {
        Self {
            search_results,
            ..Self::default()
        }
    }
}
