use serde::{Deserialize, Serialize};

/// Tool definition sent to the model as part of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Display payload produced by a `show_*` tool, rendered by the UI
/// collaborator alongside the agent message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichContent {
    Comparison {
        dimension: String,
        systems: Vec<ComparisonEntry>,
    },
    Hierarchy {
        title: String,
        root: serde_json::Value,
    },
    Table {
        title: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub system: String,
    pub value: String,
}
