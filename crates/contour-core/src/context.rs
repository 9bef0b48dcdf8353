use serde::{Deserialize, Serialize};

use crate::messages::Message;
use crate::tools::ToolDefinition;

/// Everything sent to the gateway for one model invocation.
#[derive(Clone, Debug)]
pub struct PromptContext {
    pub system_blocks: Vec<SystemBlock>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

impl PromptContext {
    /// Empty context (useful for testing).
    pub fn empty() -> Self {
        Self {
            system_blocks: Vec::new(),
            messages: Vec::new(),
            tools: Vec::new(),
        }
    }
}

/// A layer of the composed instruction text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemBlock {
    pub content: String,
    pub stability: Stability,
    pub label: BlockLabel,
}

/// Cache-TTL classification for system blocks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    /// Content never varies per session.
    Stable,
    /// Content is regenerated every turn.
    Volatile,
}

/// Which instruction layer a block belongs to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockLabel {
    Identity,
    SessionContext,
    SectionGuidance,
    LiveSystemData,
}
