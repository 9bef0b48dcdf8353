//! Retry wrapper for retryable gateway errors.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use contour_core::context::PromptContext;
use contour_core::errors::GatewayError;
use contour_core::gateway::{ChatGateway, RequestOptions};
use contour_core::messages::AssistantMessage;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Wraps a gateway with exponential backoff on retryable errors.
/// `retry_after` hints from rate-limit responses take precedence over the
/// computed backoff. Fatal errors return immediately.
pub struct ReliableGateway<G: ChatGateway> {
    inner: G,
    config: RetryConfig,
}

impl<G: ChatGateway> ReliableGateway<G> {
    pub fn new(inner: G, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn with_defaults(inner: G) -> Self {
        Self::new(inner, RetryConfig::default())
    }

    fn delay_for_attempt(&self, attempt: u32, error: &GatewayError) -> Duration {
        if let Some(hint) = error.suggested_delay() {
            return hint.min(self.config.max_delay);
        }
        let backoff = self.config.base_delay * 2u32.saturating_pow(attempt);
        backoff.min(self.config.max_delay)
    }
}

#[async_trait]
impl<G: ChatGateway> ChatGateway for ReliableGateway<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(
        &self,
        context: &PromptContext,
        options: &RequestOptions,
    ) -> Result<AssistantMessage, GatewayError> {
        let mut attempt = 0u32;
        loop {
            match self.inner.complete(context, options).await {
                Ok(msg) => return Ok(msg),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.delay_for_attempt(attempt, &e);
                    warn!(
                        error_kind = e.error_kind(),
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "gateway call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
