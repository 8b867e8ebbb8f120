//! OpenAI adapter for chat completions and embeddings.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::error::{ErrorContext, ProviderError};
use super::types::*;

// =============================================================================
// TRAIT
// =============================================================================

/// Trait for chat completion providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbedProvider: Send + Sync {
    async fn embed(&self, req: &EmbedRequest) -> Result<EmbedResponse, ProviderError>;
}

// =============================================================================
// OPENAI ADAPTER
// =============================================================================

/// Maximum allowed response body length (1MB).
const MAX_RESPONSE_LEN: usize = 1_024 * 1_024;

/// Maximum allowed input characters (~125k tokens).
const MAX_INPUT_CHARS: usize = 500_000;

/// OpenAI API adapter.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiAdapter {
    /// Create from API key with default endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_config(api_key, "https://api.openai.com/v1", Duration::from_secs(120))
    }

    /// Create from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; absence is a startup-fatal config error.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::config("OPENAI_API_KEY not set"))?;

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());

        let timeout = std::env::var("OPENAI_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));

        Self::with_config(api_key, base_url, timeout)
    }

    /// Create with custom configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        let base_url = base_url.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ProviderError::config("Invalid API key format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    /// Collect a response body with the size cap enforced while streaming.
    async fn read_body(mut response: reqwest::Response) -> Result<String, ProviderError> {
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let new_len = bytes.len() + chunk.len();
            if new_len > MAX_RESPONSE_LEN {
                return Err(ProviderError::provider(
                    "openai",
                    format!("Response too large: {new_len} bytes"),
                    false,
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    fn error_from_body(
        status: reqwest::StatusCode,
        body: &str,
    ) -> ProviderError {
        let ctx = ErrorContext::new().with_status(status.as_u16());

        if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body) {
            if let Some(error) = parsed.error {
                let message = error.message.unwrap_or_default();
                let ctx = if let Some(code) = error.code {
                    ctx.with_code(code)
                } else {
                    ctx
                };

                return match status.as_u16() {
                    429 => ProviderError::rate_limited(Duration::from_secs(60), ctx),
                    _ => ProviderError::provider_with_context(
                        "openai",
                        message,
                        status.as_u16() >= 500,
                        ctx,
                    ),
                };
            }
        }

        ProviderError::provider_with_context(
            "openai",
            format!("HTTP {}", status.as_u16()),
            status.as_u16() >= 500,
            ctx,
        )
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: match m.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: m.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    choices: Option<Vec<Choice>>,
    usage: Option<Usage>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
    code: Option<String>,
}

#[derive(Serialize)]
struct EmbedApiRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedApiResponse {
    data: Option<Vec<EmbedDatum>>,
    usage: Option<Usage>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    index: Option<usize>,
    embedding: Vec<f32>,
}

// =============================================================================
// CHAT PROVIDER IMPL
// =============================================================================

#[async_trait]
impl ChatProvider for OpenAiAdapter {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let total_chars: usize = req.messages.iter().map(|m| m.content.len()).sum();
        if total_chars > MAX_INPUT_CHARS {
            return Err(ProviderError::invalid_request(format!(
                "Input too large: {total_chars} chars (max {MAX_INPUT_CHARS})"
            )));
        }

        let start = Instant::now();

        let messages: Vec<ApiMessage> = req.messages.iter().map(ApiMessage::from).collect();

        let api_req = ChatApiRequest {
            model: req.model.model_id(),
            messages: &messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            response_format: if req.json_mode {
                Some(ResponseFormat {
                    format_type: "json_object",
                })
            } else {
                None
            },
        };

        let response = self.client.post(self.chat_url()).json(&api_req).send().await?;
        let status = response.status();
        let body = Self::read_body(response).await?;

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }

        let parsed: ChatApiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::provider("openai", format!("Invalid JSON: {e}"), false))?;

        if let Some(error) = parsed.error {
            return Err(ProviderError::provider(
                "openai",
                error.message.unwrap_or_default(),
                false,
            ));
        }

        let choice = parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| ProviderError::provider("openai", "No choices in response", false))?;

        let mut content = choice
            .message
            .and_then(|m| m.content)
            .unwrap_or_default();
        if content.len() > MAX_RESPONSE_LEN {
            content.truncate(MAX_RESPONSE_LEN);
        }

        let usage = parsed.usage.unwrap_or(Usage {
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
        });

        Ok(ChatResponse {
            content,
            input_tokens: usage.prompt_tokens.unwrap_or(0),
            output_tokens: usage.completion_tokens.unwrap_or(0),
            latency: start.elapsed(),
            finish_reason: FinishReason::from(choice.finish_reason),
        })
    }
}

// =============================================================================
// EMBED PROVIDER IMPL
// =============================================================================

#[async_trait]
impl EmbedProvider for OpenAiAdapter {
    async fn embed(&self, req: &EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        if req.texts.is_empty() {
            return Err(ProviderError::invalid_request("No texts to embed"));
        }

        let start = Instant::now();

        let api_req = EmbedApiRequest {
            model: req.model.as_str(),
            input: &req.texts,
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .json(&api_req)
            .send()
            .await?;
        let status = response.status();
        let body = Self::read_body(response).await?;

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }

        let parsed: EmbedApiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::provider("openai", format!("Invalid JSON: {e}"), false))?;

        if let Some(error) = parsed.error {
            return Err(ProviderError::provider(
                "openai",
                error.message.unwrap_or_default(),
                false,
            ));
        }

        let mut data = parsed
            .data
            .ok_or_else(|| ProviderError::provider("openai", "No data in response", false))?;

        if data.len() != req.texts.len() {
            return Err(ProviderError::provider(
                "openai",
                format!(
                    "Embedding count mismatch: {} texts, {} vectors",
                    req.texts.len(),
                    data.len()
                ),
                false,
            ));
        }

        // The API documents index-ordered results; sort defensively anyway.
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        let embeddings = data.into_iter().map(|d| d.embedding).collect();

        let tokens = parsed
            .usage
            .and_then(|u| u.total_tokens.or(u.prompt_tokens))
            .unwrap_or(0);

        Ok(EmbedResponse {
            embeddings,
            tokens,
            latency: start.elapsed(),
        })
    }
}
