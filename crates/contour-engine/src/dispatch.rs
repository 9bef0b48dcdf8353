//! Tool dispatcher: routes a named tool invocation to the contour map
//! store, a display payload, or a state action — plus the two read-only
//! external lookups that bypass the store entirely.

use std::sync::Arc;

use serde_json::{json, Value};

use contour_core::contour::ContourMap;
use contour_core::ids::CustomerId;
use contour_core::messages::ToolCallBlock;
use contour_core::tools::RichContent;

use crate::contour;
use crate::lookup::{SystemLookup, SystemQueryKind};
use crate::state::StateAction;

/// Closed set of tool kinds, with an explicit arm for anything else the
/// model invents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    UpdateContour,
    ShowComparison,
    ShowHierarchy,
    ShowTable,
    ParkItem,
    AdvanceSection,
    ProcessFile,
    LookupSystemData,
    Unknown,
}

impl ToolKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "update_contour" => Self::UpdateContour,
            "show_comparison" => Self::ShowComparison,
            "show_hierarchy" => Self::ShowHierarchy,
            "show_table" => Self::ShowTable,
            "park_item" => Self::ParkItem,
            "advance_section" => Self::AdvanceSection,
            "process_file" => Self::ProcessFile,
            "lookup_system_data" => Self::LookupSystemData,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of one dispatched call: the (possibly unchanged) map, at most one
/// side effect, and the reply fed back to the model as the tool result.
pub struct DispatchResult {
    pub map: ContourMap,
    pub display: Option<RichContent>,
    pub state_action: Option<StateAction>,
    pub reply: String,
}

pub struct ToolDispatcher {
    lookup: Option<Arc<SystemLookup>>,
}

impl ToolDispatcher {
    pub fn new(lookup: Option<Arc<SystemLookup>>) -> Self {
        Self { lookup }
    }

    pub async fn dispatch(
        &self,
        call: &ToolCallBlock,
        map: &ContourMap,
        customer_id: &CustomerId,
        now: &str,
    ) -> DispatchResult {
        match ToolKind::parse(&call.name) {
            ToolKind::ProcessFile => DispatchResult {
                map: map.clone(),
                display: None,
                state_action: None,
                reply: resolve_file(&call.input, map),
            },
            ToolKind::LookupSystemData => DispatchResult {
                map: map.clone(),
                display: None,
                state_action: None,
                reply: self.lookup_system_data(&call.input, customer_id).await,
            },
            _ => {
                let outcome = contour::apply_tool(&call.name, &call.input, map, now);
                DispatchResult {
                    map: outcome.map,
                    display: outcome.display,
                    state_action: outcome.state_action,
                    reply: json!({"success": true}).to_string(),
                }
            }
        }
    }

    async fn lookup_system_data(&self, input: &Value, customer_id: &CustomerId) -> String {
        let Some(lookup) = &self.lookup else {
            return json!({"available": false, "reason": "system data lookups not configured"})
                .to_string();
        };

        let kind = input
            .get("query_type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<SystemQueryKind>().ok());

        match kind {
            Some(kind) => {
                let dimension = input.get("dimension").and_then(Value::as_str);
                lookup.query(customer_id, kind, dimension).await.to_string()
            }
            None => json!({"available": false, "reason": "unknown query_type"}).to_string(),
        }
    }
}

/// Resolve a prior extraction by its opaque file id. Read-only: the map is
/// never touched.
fn resolve_file(input: &Value, map: &ContourMap) -> String {
    let file_id = input.get("file_id").and_then(Value::as_str).unwrap_or_default();
    match map.uploaded_artifacts.iter().find(|a| a.id == file_id) {
        Some(artifact) => json!({
            "filename": artifact.filename,
            "mime_type": artifact.mime_type,
            "extracted_data": artifact.extracted_data,
        })
        .to_string(),
        None => json!({"found": false, "file_id": file_id}).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_core::contour::UploadedArtifact;
    use contour_core::ids::ToolCallId;

    const NOW: &str = "2026-02-01T12:00:00Z";

    fn call(name: &str, input: Value) -> ToolCallBlock {
        ToolCallBlock {
            id: ToolCallId::new(),
            name: name.into(),
            input,
        }
    }

    fn customer() -> CustomerId {
        CustomerId::from_raw("cust_test")
    }

    #[test]
    fn tool_kind_parsing() {
        assert_eq!(ToolKind::parse("update_contour"), ToolKind::UpdateContour);
        assert_eq!(ToolKind::parse("advance_section"), ToolKind::AdvanceSection);
        assert_eq!(ToolKind::parse("process_file"), ToolKind::ProcessFile);
        assert_eq!(ToolKind::parse("lookup_system_data"), ToolKind::LookupSystemData);
        assert_eq!(ToolKind::parse("made_up_tool"), ToolKind::Unknown);
    }

    #[tokio::test]
    async fn mutating_tool_replies_success() {
        let dispatcher = ToolDispatcher::new(None);
        let map = ContourMap::empty(NOW);
        let result = dispatcher
            .dispatch(
                &call(
                    "update_contour",
                    json!({
                        "dimension_type": "vocabulary_map",
                        "operation": "add",
                        "node_data": {"term": "BU", "meaning": "Business Unit"},
                    }),
                ),
                &map,
                &customer(),
                NOW,
            )
            .await;

        assert_eq!(result.reply, r#"{"success":true}"#);
        assert_eq!(result.map.vocabulary_map.len(), 1);
        assert!(result.display.is_none());
        assert!(result.state_action.is_none());
    }

    #[tokio::test]
    async fn exactly_one_side_effect_category_per_call() {
        let dispatcher = ToolDispatcher::new(None);
        let map = ContourMap::empty(NOW);

        let display = dispatcher
            .dispatch(
                &call("show_table", json!({"title": "T", "headers": [], "rows": []})),
                &map,
                &customer(),
                NOW,
            )
            .await;
        assert!(display.display.is_some());
        assert!(display.state_action.is_none());

        let action = dispatcher
            .dispatch(&call("advance_section", json!({"summary": "done"})), &map, &customer(), NOW)
            .await;
        assert!(action.display.is_none());
        assert_eq!(action.state_action, Some(StateAction::Advance));
    }

    #[tokio::test]
    async fn process_file_resolves_prior_extraction() {
        let dispatcher = ToolDispatcher::new(None);
        let mut map = ContourMap::empty(NOW);
        map.uploaded_artifacts.push(UploadedArtifact {
            id: "file_1".into(),
            filename: "org_chart.xlsx".into(),
            mime_type: "application/vnd.ms-excel".into(),
            extracted_data: json!({"sheets": ["Divisions"]}),
            section: "1".into(),
            uploaded_at: NOW.into(),
        });

        let result = dispatcher
            .dispatch(&call("process_file", json!({"file_id": "file_1"})), &map, &customer(), NOW)
            .await;

        let reply: Value = serde_json::from_str(&result.reply).unwrap();
        assert_eq!(reply["filename"], "org_chart.xlsx");
        assert_eq!(reply["extracted_data"]["sheets"][0], "Divisions");
        // Read-only: the map passes through untouched.
        assert_eq!(result.map.uploaded_artifacts.len(), 1);
        assert!(result.display.is_none());
    }

    #[tokio::test]
    async fn process_file_unknown_id_reports_not_found() {
        let dispatcher = ToolDispatcher::new(None);
        let map = ContourMap::empty(NOW);
        let result = dispatcher
            .dispatch(&call("process_file", json!({"file_id": "ghost"})), &map, &customer(), NOW)
            .await;
        let reply: Value = serde_json::from_str(&result.reply).unwrap();
        assert_eq!(reply["found"], false);
    }

    #[tokio::test]
    async fn lookup_without_client_degrades() {
        let dispatcher = ToolDispatcher::new(None);
        let map = ContourMap::empty(NOW);
        let result = dispatcher
            .dispatch(
                &call("lookup_system_data", json!({"query_type": "systems"})),
                &map,
                &customer(),
                NOW,
            )
            .await;
        let reply: Value = serde_json::from_str(&result.reply).unwrap();
        assert_eq!(reply["available"], false);
    }

    #[tokio::test]
    async fn lookup_unknown_query_type_degrades() {
        use crate::lookup::{LookupConfig, SystemLookup};
        let lookup = Arc::new(SystemLookup::new(LookupConfig::new(
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
            "k",
        )));
        let dispatcher = ToolDispatcher::new(Some(lookup));
        let map = ContourMap::empty(NOW);
        let result = dispatcher
            .dispatch(
                &call("lookup_system_data", json!({"query_type": "astrology"})),
                &map,
                &customer(),
                NOW,
            )
            .await;
        let reply: Value = serde_json::from_str(&result.reply).unwrap();
        assert_eq!(reply["available"], false);
        assert_eq!(reply["reason"], "unknown query_type");
    }

    #[tokio::test]
    async fn unknown_tool_still_replies_success() {
        let dispatcher = ToolDispatcher::new(None);
        let map = ContourMap::empty(NOW);
        let result = dispatcher
            .dispatch(&call("experimental_tool", json!({})), &map, &customer(), NOW)
            .await;
        assert_eq!(result.reply, r#"{"success":true}"#);
        assert!(result.display.is_none());
        assert!(result.state_action.is_none());
    }
}
