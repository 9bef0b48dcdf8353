use async_trait::async_trait;

use crate::context::PromptContext;
use crate::errors::GatewayError;
use crate::messages::AssistantMessage;

/// Options controlling generation behavior.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// Request/response boundary to the generative backend: send conversation
/// plus tools, receive text and/or tool invocations.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(
        &self,
        context: &PromptContext,
        options: &RequestOptions,
    ) -> Result<AssistantMessage, GatewayError>;
}
