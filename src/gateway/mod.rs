//! Inference gateway: chat completions and embeddings with bounded retry.

pub mod error;
pub mod openai;
pub mod types;

use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use openai::{ChatProvider, EmbedProvider, OpenAiAdapter};

pub use error::{ErrorContext, ProviderError};
pub use types::*;

/// Trait for issuing chat completions. Components take this at their seams so
/// tests can script responses without a network.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Trait for issuing embedding requests.
#[async_trait::async_trait]
pub trait EmbedGateway: Send + Sync {
    async fn embed(&self, req: EmbedRequest) -> Result<EmbedResponse, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Adapter plus retry policy. All pipeline stages call providers through this.
pub struct ProviderGateway {
    adapter: OpenAiAdapter,
    config: GatewayConfig,
}

impl ProviderGateway {
    pub fn from_env() -> Result<Self, ProviderError> {
        let adapter = OpenAiAdapter::from_env()?;
        Ok(Self {
            adapter,
            config: GatewayConfig::default(),
        })
    }

    pub fn with_config(adapter: OpenAiAdapter, config: GatewayConfig) -> Self {
        Self { adapter, config }
    }

    async fn chat_with_retry(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.adapter.chat(req).await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    if !err.is_retryable() || attempt == self.config.max_retries {
                        return Err(err);
                    }
                    warn!(
                        caller = req.caller,
                        code = err.code(),
                        attempt,
                        "chat call failed; retrying"
                    );
                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    last_error = Some(err);
                    sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::provider("openai", "unknown error", false)))
    }

    async fn embed_with_retry(&self, req: &EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.adapter.embed(req).await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    if !err.is_retryable() || attempt == self.config.max_retries {
                        return Err(err);
                    }
                    warn!(
                        caller = req.caller,
                        code = err.code(),
                        attempt,
                        "embed call failed; retrying"
                    );
                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    last_error = Some(err);
                    sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::provider("openai", "unknown error", false)))
    }
}

#[async_trait::async_trait]
impl ChatGateway for ProviderGateway {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.chat_with_retry(&req).await
    }
}

#[async_trait::async_trait]
impl EmbedGateway for ProviderGateway {
    async fn embed(&self, req: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        self.embed_with_retry(&req).await
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let multiplier = 2u64.pow(attempt.min(5));
    base * multiplier as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
    }

    #[test]
    fn backoff_caps_exponent() {
        let base = Duration::from_millis(1);
        assert_eq!(backoff_delay(base, 10), backoff_delay(base, 5));
    }
}
