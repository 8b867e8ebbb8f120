//! Document retrieval collaborator.
//!
//! Wraps the Tavily search API behind the [`SearchProvider`] trait. Retrieval
//! failure is never fatal to a run: callers receive an empty document set and
//! the pipeline degrades to "no candidates".

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gateway::error::ProviderError;

/// Maximum excerpt length kept per document.
const MAX_EXCERPT_CHARS: usize = 500;

/// A retrieved web document. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub url: String,
    /// Bounded excerpt of the page content.
    pub content: String,
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: truncate_chars(&content.into(), MAX_EXCERPT_CHARS),
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Trait for web search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<Document>, ProviderError>;
}

// =============================================================================
// TAVILY ADAPTER
// =============================================================================

/// Tavily search API adapter.
#[derive(Debug, Clone)]
pub struct TavilyAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TavilyAdapter {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_config(api_key, "https://api.tavily.com", Duration::from_secs(60))
    }

    /// Create from environment variables.
    ///
    /// `TAVILY_API_KEY` is required; absence is a startup-fatal config error.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| ProviderError::config("TAVILY_API_KEY not set"))?;

        let base_url =
            std::env::var("TAVILY_BASE_URL").unwrap_or_else(|_| "https://api.tavily.com".into());

        let timeout = std::env::var("TAVILY_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self::with_config(api_key, base_url, timeout)
    }

    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[derive(Serialize)]
struct SearchApiRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchApiResponse {
    #[serde(default)]
    results: Vec<SearchApiResult>,
}

#[derive(Deserialize)]
struct SearchApiResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

#[async_trait]
impl SearchProvider for TavilyAdapter {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Document>, ProviderError> {
        let api_req = SearchApiRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let response = self
            .client
            .post(self.search_url())
            .json(&api_req)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::provider(
                "tavily",
                format!("HTTP {}", status.as_u16()),
                status.as_u16() >= 500,
            ));
        }

        let parsed: SearchApiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::provider("tavily", format!("Invalid JSON: {e}"), false))?;

        let docs = parsed
            .results
            .into_iter()
            .map(|r| {
                Document::new(
                    r.title.unwrap_or_else(|| "untitled".to_string()),
                    r.url.unwrap_or_else(|| "N/A".to_string()),
                    r.content.unwrap_or_default(),
                )
            })
            .collect();

        Ok(docs)
    }
}

// =============================================================================
// TREND DISCOVERY
// =============================================================================

/// Queries used to surface not-yet-commercialized technology trends.
pub const DISCOVERY_QUERIES: &[&str] = &[
    "\"AI technologies that are not yet commercialized but expected to gain significant attention within the next 3-5 years\"",
    "\"paradigm-shifting AI technologies emerging in the next 3-5 years\"",
    "\"next frontier areas of AI research\"",
    "\"disruptive AI innovations around 2030 that will reshape industries\"",
    "\"future AI architectures that will lead the next paradigm shift\"",
];

/// Domains the discovery search is restricted to.
pub const RELIABLE_DOMAINS: &[&str] = &[
    "nature.com",
    "arxiv.org",
    "research.ibm.com",
    "deepmind.google",
    "mit.edu",
    "stanford.edu",
    "openai.com",
    "microsoft.com/en-us/research",
    "nvidia.com",
    "hbr.org",
];

/// Render a `site:` filter clause over the reliable domains.
pub fn site_filter(domains: &[&str]) -> String {
    domains
        .iter()
        .map(|d| format!("site:{d}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Run the discovery queries and collect documents.
///
/// Per-query failures are logged and skipped; an empty result set is a valid
/// outcome, not an error.
pub async fn discover_documents(
    search: &dyn SearchProvider,
    max_results_per_query: usize,
) -> Vec<Document> {
    let filter = site_filter(RELIABLE_DOMAINS);
    let mut documents = Vec::new();

    for query in DISCOVERY_QUERIES {
        let filtered_query = format!("{query} AND ({filter})");
        info!(query = %filtered_query, "running discovery search");
        match search.search(&filtered_query, max_results_per_query).await {
            Ok(docs) => documents.extend(docs),
            Err(err) => {
                warn!(code = err.code(), error = %err, "discovery search failed; skipping query");
            }
        }
    }

    info!(count = documents.len(), "collected discovery documents");
    documents
}
