//! Core types for the inference gateway.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// CHAT TYPES
// =============================================================================

/// Chat message role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat model specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatModel(String);

impl ChatModel {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self(model_id.into())
    }

    pub fn model_id(&self) -> &str {
        &self.0
    }
}

impl Default for ChatModel {
    fn default() -> Self {
        Self("gpt-4o-mini".to_string())
    }
}

/// Request for chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model to use.
    pub model: ChatModel,
    /// Messages in the conversation.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Whether to request JSON output.
    pub json_mode: bool,
    /// Which code path made this call, for log lines.
    pub caller: &'static str,
}

impl ChatRequest {
    pub fn new(model: ChatModel, messages: Vec<Message>, caller: &'static str) -> Self {
        Self {
            model,
            messages,
            temperature: 0.0,
            max_tokens: None,
            json_mode: false,
            caller,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown(String),
}

impl From<Option<String>> for FinishReason {
    fn from(s: Option<String>) -> Self {
        match s.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some(other) => FinishReason::Unknown(other.to_string()),
            None => FinishReason::Unknown("none".to_string()),
        }
    }
}

/// Response from chat completion.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated content.
    pub content: String,
    /// Input tokens consumed.
    pub input_tokens: u32,
    /// Output tokens generated.
    pub output_tokens: u32,
    /// Time taken for the request.
    pub latency: Duration,
    /// Why the model stopped.
    pub finish_reason: FinishReason,
}

impl ChatResponse {
    pub(crate) fn empty() -> Self {
        Self {
            content: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            latency: Duration::from_millis(0),
            finish_reason: FinishReason::Unknown("error".to_string()),
        }
    }
}

// =============================================================================
// EMBEDDING TYPES
// =============================================================================

/// Embedding model to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedModel {
    /// OpenAI text-embedding-3-small (1536 dimensions)
    #[default]
    OpenAI3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    OpenAI3Large,
}

impl EmbedModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedModel::OpenAI3Small => "text-embedding-3-small",
            EmbedModel::OpenAI3Large => "text-embedding-3-large",
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            EmbedModel::OpenAI3Small => 1536,
            EmbedModel::OpenAI3Large => 3072,
        }
    }
}

/// Request to embed texts. Each text produces one embedding vector.
#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub model: EmbedModel,
    pub texts: Vec<String>,
    pub caller: &'static str,
}

impl EmbedRequest {
    pub fn new(model: EmbedModel, texts: Vec<String>, caller: &'static str) -> Self {
        Self {
            model,
            texts,
            caller,
        }
    }
}

/// Response from embedding request.
#[derive(Debug, Clone)]
pub struct EmbedResponse {
    /// Embedding vectors, one per input text.
    pub embeddings: Vec<Vec<f32>>,
    /// Total tokens consumed.
    pub tokens: u32,
    /// Time taken for the request.
    pub latency: Duration,
}
