//! Scripted gateway for deterministic tests without API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use contour_core::context::PromptContext;
use contour_core::errors::GatewayError;
use contour_core::gateway::{ChatGateway, RequestOptions};
use contour_core::ids::ToolCallId;
use contour_core::messages::{AssistantContent, AssistantMessage, StopReason, ToolCallBlock};

/// One pre-programmed reply.
pub enum MockReply {
    Message(AssistantMessage),
    Error(GatewayError),
}

impl MockReply {
    /// Plain text reply.
    pub fn text(text: &str) -> Self {
        Self::Message(AssistantMessage::text(text))
    }

    /// Reply with optional text followed by tool calls.
    pub fn tool_calls(text: Option<&str>, calls: Vec<(&str, Value)>) -> Self {
        let mut content = Vec::new();
        if let Some(text) = text {
            content.push(AssistantContent::Text { text: text.to_string() });
        }
        for (name, input) in calls {
            content.push(AssistantContent::ToolCall(ToolCallBlock {
                id: ToolCallId::new(),
                name: name.to_string(),
                input,
            }));
        }
        Self::Message(AssistantMessage {
            content,
            stop_reason: Some(StopReason::ToolUse),
        })
    }

    pub fn error(error: GatewayError) -> Self {
        Self::Error(error)
    }
}

/// Gateway that returns scripted replies in order.
pub struct MockGateway {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(
        &self,
        _context: &PromptContext,
        _options: &RequestOptions,
    ) -> Result<AssistantMessage, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(MockReply::Message(msg)) => Ok(msg),
            Some(MockReply::Error(e)) => Err(e),
            None => Err(GatewayError::InvalidRequest(format!(
                "MockGateway: no reply scripted for call {call}"
            ))),
        }
    }
}
