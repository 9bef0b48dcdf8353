//! Contour map store: applies tool-mediated updates to the map document and
//! recomputes the completeness score. Pure functions of their inputs so a
//! turn can be retried or replayed safely.

use serde_json::Value;
use uuid::Uuid;

use contour_core::contour::{
    Conflict, ConflictStatus, ContourMap, FollowUpTask, HierarchyNode, HierarchyNodeType,
    PriorityQuery, Provenance, SorEntry, SystemValue, TaskStatus, VocabularyEntry,
};
use contour_core::tools::{ComparisonEntry, RichContent};

use crate::state::StateAction;

/// Result of applying one tool call: at most one side effect category.
pub struct ToolOutcome {
    pub map: ContourMap,
    pub display: Option<RichContent>,
    pub state_action: Option<StateAction>,
}

impl ToolOutcome {
    fn map_only(map: ContourMap) -> Self {
        Self { map, display: None, state_action: None }
    }
}

/// Apply a named tool call to the map. Unknown tool names are no-ops —
/// the model may emit calls outside the expected set, and that must not
/// abort the round.
pub fn apply_tool(name: &str, input: &Value, map: &ContourMap, now: &str) -> ToolOutcome {
    let mut map = map.clone();
    map.metadata.last_updated = now.to_string();

    match name {
        "update_contour" => apply_update_contour(input, map),
        "show_comparison" => ToolOutcome {
            display: Some(comparison_payload(input)),
            map,
            state_action: None,
        },
        "show_hierarchy" => ToolOutcome {
            display: Some(RichContent::Hierarchy {
                title: str_field(input, "title"),
                root: input.get("root").cloned().unwrap_or(Value::Null),
            }),
            map,
            state_action: None,
        },
        "show_table" => ToolOutcome {
            display: Some(RichContent::Table {
                title: str_field(input, "title"),
                headers: string_list(input.get("headers")),
                rows: row_list(input.get("rows")),
            }),
            map,
            state_action: None,
        },
        "park_item" => apply_park_item(input, map, now),
        "advance_section" => ToolOutcome {
            map,
            display: None,
            state_action: Some(StateAction::Advance),
        },
        _ => ToolOutcome::map_only(map),
    }
}

// ── update_contour ──────────────────────────────────────────────────

fn apply_update_contour(input: &Value, mut map: ContourMap) -> ToolOutcome {
    let dimension_type = str_field(input, "dimension_type");
    let operation = opt_str_field(input, "operation").unwrap_or_else(|| "add".into());
    let empty = Value::Object(Default::default());
    let node_data = input.get("node_data").unwrap_or(&empty);
    let confidence = input
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.8);
    let provenance = input
        .get("provenance")
        .and_then(|v| serde_json::from_value::<Provenance>(v.clone()).ok())
        .unwrap_or(Provenance::StakeholderConfirmed);

    match dimension_type.as_str() {
        "organizational_hierarchy" => {
            let node = parse_hierarchy_node(node_data, confidence, provenance);
            match operation.as_str() {
                "add" => insert_node(&mut map.organizational_hierarchy, node),
                "update" => update_node(&mut map.organizational_hierarchy, node),
                "remove" => remove_node(&mut map.organizational_hierarchy, &node.id),
                _ => {}
            }
        }
        "management_overlay" => {
            let node = parse_hierarchy_node(node_data, confidence, provenance);
            match operation.as_str() {
                "add" => insert_node(&mut map.management_overlay, node),
                "update" => update_node(&mut map.management_overlay, node),
                _ => {}
            }
        }
        "sor_authority_map" => {
            let entry = SorEntry {
                dimension: str_field(node_data, "dimension"),
                system: str_field(node_data, "system"),
                confidence,
                confirmed_by: opt_str_field(node_data, "confirmed_by"),
                conflicts: string_list(node_data.get("conflicts")),
                notes: str_field(node_data, "notes"),
            };
            match operation.as_str() {
                "add" => map.sor_authority_map.push(entry),
                "update" => {
                    let existing = map
                        .sor_authority_map
                        .iter()
                        .position(|e| e.dimension == entry.dimension);
                    match existing {
                        Some(idx) => map.sor_authority_map[idx] = entry,
                        None => map.sor_authority_map.push(entry),
                    }
                }
                _ => {}
            }
        }
        "conflict_register" => {
            let conflict = Conflict {
                id: opt_str_field(node_data, "id").unwrap_or_else(generated_id),
                dimension: str_field(node_data, "dimension"),
                systems: system_values(node_data.get("systems")),
                resolution: opt_str_field(node_data, "resolution"),
                resolved_by: opt_str_field(node_data, "resolved_by"),
                status: node_data
                    .get("status")
                    .and_then(|v| serde_json::from_value::<ConflictStatus>(v.clone()).ok())
                    .unwrap_or(ConflictStatus::Open),
            };
            match operation.as_str() {
                "add" => map.conflict_register.push(conflict),
                "update" => {
                    if let Some(existing) =
                        map.conflict_register.iter_mut().find(|c| c.id == conflict.id)
                    {
                        *existing = conflict;
                    }
                }
                _ => {}
            }
        }
        // Append-only dimensions: every call is an addition, whatever the
        // stated operation.
        "vocabulary_map" => {
            map.vocabulary_map.push(VocabularyEntry {
                term: str_field(node_data, "term"),
                meaning: str_field(node_data, "meaning"),
                context: str_field(node_data, "context"),
                system_equivalent: opt_str_field(node_data, "system_equivalent"),
            });
        }
        "priority_queries" => {
            map.priority_queries.push(PriorityQuery {
                id: opt_str_field(node_data, "id").unwrap_or_else(generated_id),
                question: str_field(node_data, "question"),
                business_context: str_field(node_data, "business_context"),
                frequency: str_field(node_data, "frequency"),
                current_pain: str_field(node_data, "current_pain"),
                priority: node_data.get("priority").and_then(Value::as_i64).unwrap_or(0) as i32,
            });
        }
        _ => {}
    }

    map.metadata.completeness_score = completeness(&map);
    ToolOutcome::map_only(map)
}

fn apply_park_item(input: &Value, mut map: ContourMap, now: &str) -> ToolOutcome {
    let task = FollowUpTask {
        id: generated_id(),
        description: format!("{}: {}", str_field(input, "dimension"), str_field(input, "question")),
        assigned_to: opt_str_field(input, "suggested_person"),
        section: String::new(),
        status: TaskStatus::Open,
        created_at: now.to_string(),
    };
    map.follow_up_tasks.push(task);
    ToolOutcome::map_only(map)
}

/// Record an ingested file on the map.
pub fn add_artifact(
    map: &ContourMap,
    artifact: contour_core::contour::UploadedArtifact,
    now: &str,
) -> ContourMap {
    let mut map = map.clone();
    map.uploaded_artifacts.push(artifact);
    map.metadata.last_updated = now.to_string();
    map
}

// ── Hierarchy forest operations ─────────────────────────────────────
//
// Mutations locate the target with an iterative path search first, then
// descend by index. Keeps traversal depth off the call stack and makes the
// insertion cycle check explicit.

/// DFS path (child indices from the roots) to the node with `id`.
fn find_path(forest: &[HierarchyNode], id: &str) -> Option<Vec<usize>> {
    let mut stack: Vec<Vec<usize>> = (0..forest.len()).rev().map(|i| vec![i]).collect();

    while let Some(path) = stack.pop() {
        let node = resolve(forest, &path);
        if node.id == id {
            return Some(path);
        }
        for i in (0..node.children.len()).rev() {
            let mut child_path = path.clone();
            child_path.push(i);
            stack.push(child_path);
        }
    }
    None
}

fn resolve<'a>(forest: &'a [HierarchyNode], path: &[usize]) -> &'a HierarchyNode {
    let mut node = &forest[path[0]];
    for &i in &path[1..] {
        node = &node.children[i];
    }
    node
}

/// The sibling list holding the node at `path`.
fn siblings_mut<'a>(forest: &'a mut Vec<HierarchyNode>, path: &[usize]) -> &'a mut Vec<HierarchyNode> {
    let mut list = forest;
    for &i in &path[..path.len() - 1] {
        list = &mut list[i].children;
    }
    list
}

/// True when `candidate` lies inside the subtree rooted at `ancestor_id`.
fn is_descendant(forest: &[HierarchyNode], ancestor_id: &str, candidate: &str) -> bool {
    let Some(path) = find_path(forest, ancestor_id) else {
        return false;
    };
    let root = resolve(forest, &path);
    let mut stack: Vec<&HierarchyNode> = root.children.iter().collect();
    while let Some(node) = stack.pop() {
        if node.id == candidate {
            return true;
        }
        stack.extend(node.children.iter());
    }
    false
}

/// Insert under `parent_id` when that node exists; otherwise insert at root
/// level. A parent inside the inserted node's own subtree would create a
/// cycle, so that case also falls back to root. Data is never dropped.
fn insert_node(forest: &mut Vec<HierarchyNode>, node: HierarchyNode) {
    let parent_id = match &node.parent_id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => {
            forest.push(node);
            return;
        }
    };

    if parent_id == node.id || is_descendant(forest, &node.id, &parent_id) {
        forest.push(node);
        return;
    }

    match find_path(forest, &parent_id) {
        Some(path) => {
            let mut list = &mut *forest;
            for &i in &path {
                list = &mut list[i].children;
            }
            list.push(node);
        }
        None => forest.push(node),
    }
}

/// Replace every field of the node with `id` except its existing children.
/// No-op when the id is absent. `parent_id` is overwritten without
/// re-validating placement, matching the established update semantics.
fn update_node(forest: &mut Vec<HierarchyNode>, node: HierarchyNode) {
    let Some(path) = find_path(forest, &node.id) else {
        return;
    };
    let list = siblings_mut(forest, &path);
    let existing = &mut list[path[path.len() - 1]];
    let children = std::mem::take(&mut existing.children);
    *existing = node;
    existing.children = children;
}

/// Remove at most one node (and its subtree) by id, wherever it sits.
fn remove_node(forest: &mut Vec<HierarchyNode>, id: &str) {
    let Some(path) = find_path(forest, id) else {
        return;
    };
    let list = siblings_mut(forest, &path);
    drop(list.remove(path[path.len() - 1]));
}

/// Total node count, roots and nested alike.
pub fn count_nodes(forest: &[HierarchyNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&HierarchyNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children.iter());
    }
    count
}

// ── Completeness scoring ────────────────────────────────────────────

const WEIGHT_HIERARCHY: f64 = 30.0;
const WEIGHT_SOR: f64 = 20.0;
const WEIGHT_CONFLICTS_RESOLVED: f64 = 15.0;
const WEIGHT_MANAGEMENT: f64 = 15.0;
const WEIGHT_VOCABULARY: f64 = 5.0;
const WEIGHT_QUERIES: f64 = 10.0;
const WEIGHT_FOLLOW_UPS: f64 = 5.0;

/// Heuristic interview-progress score, 0-100. Always recomputed from the
/// whole map — never adjusted incrementally — so identical maps always
/// score identically.
pub fn completeness(map: &ContourMap) -> u32 {
    let mut score = 0.0;

    score += capped_fraction(count_nodes(&map.organizational_hierarchy), 5) * WEIGHT_HIERARCHY;
    score += capped_fraction(map.sor_authority_map.len(), 3) * WEIGHT_SOR;

    let total_conflicts = map.conflict_register.len();
    if total_conflicts == 0 {
        score += WEIGHT_CONFLICTS_RESOLVED;
    } else {
        let resolved = map
            .conflict_register
            .iter()
            .filter(|c| c.status == ConflictStatus::Resolved)
            .count();
        score += WEIGHT_CONFLICTS_RESOLVED * (resolved as f64 / total_conflicts as f64);
    }

    if count_nodes(&map.management_overlay) > 0 {
        score += WEIGHT_MANAGEMENT;
    }

    score += capped_fraction(map.vocabulary_map.len(), 3) * WEIGHT_VOCABULARY;
    score += capped_fraction(map.priority_queries.len(), 3) * WEIGHT_QUERIES;

    // Documenting parked items is itself progress.
    if !map.follow_up_tasks.is_empty() {
        score += WEIGHT_FOLLOW_UPS;
    }

    score.round() as u32
}

fn capped_fraction(count: usize, target: usize) -> f64 {
    (count as f64 / target as f64).min(1.0)
}

// ── Input field helpers ─────────────────────────────────────────────
//
// Malformed tool input degrades to defaults; one bad call never aborts a
// round.

fn parse_hierarchy_node(data: &Value, confidence: f64, provenance: Provenance) -> HierarchyNode {
    HierarchyNode {
        id: opt_str_field(data, "id").unwrap_or_else(generated_id),
        name: str_field(data, "name"),
        node_type: data
            .get("type")
            .and_then(|v| serde_json::from_value::<HierarchyNodeType>(v.clone()).ok())
            .unwrap_or(HierarchyNodeType::Division),
        level: data.get("level").and_then(Value::as_i64).unwrap_or(0) as i32,
        parent_id: opt_str_field(data, "parent_id"),
        children: Vec::new(),
        source_system: opt_str_field(data, "source_system").unwrap_or_else(|| "stakeholder".into()),
        source_field: str_field(data, "source_field"),
        confidence,
        provenance,
        notes: str_field(data, "notes"),
    }
}

fn comparison_payload(input: &Value) -> RichContent {
    RichContent::Comparison {
        dimension: str_field(input, "dimension"),
        systems: system_values(input.get("systems"))
            .into_iter()
            .map(|sv| ComparisonEntry { system: sv.system, value: sv.value })
            .collect(),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn row_list(value: Option<&Value>) -> Vec<Vec<String>> {
    value
        .and_then(Value::as_array)
        .map(|rows| rows.iter().map(|row| string_list(Some(row))).collect())
        .unwrap_or_default()
}

fn system_values(value: Option<&Value>) -> Vec<SystemValue> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| SystemValue {
                    system: str_field(item, "system"),
                    value: str_field(item, "value"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn generated_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: &str = "2026-02-01T12:00:00Z";

    fn empty_map() -> ContourMap {
        ContourMap::empty("2026-01-01T00:00:00Z")
    }

    fn add_node(map: &ContourMap, id: &str, name: &str, parent: Option<&str>) -> ContourMap {
        apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "organizational_hierarchy",
                "operation": "add",
                "node_data": {"id": id, "name": name, "parent_id": parent},
            }),
            map,
            NOW,
        )
        .map
    }

    #[test]
    fn add_root_then_child() {
        let map = empty_map();
        let map = add_node(&map, "d1", "Commercial Banking", None);
        let map = add_node(&map, "d2", "Corporate Lending", Some("d1"));

        assert_eq!(map.organizational_hierarchy.len(), 1);
        let root = &map.organizational_hierarchy[0];
        assert_eq!(root.id, "d1");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Corporate Lending");
        assert_eq!(map.metadata.last_updated, NOW);
    }

    #[test]
    fn add_with_missing_parent_falls_back_to_root() {
        let map = add_node(&empty_map(), "d9", "Orphaned Unit", Some("nope"));
        assert_eq!(map.organizational_hierarchy.len(), 1);
        assert_eq!(map.organizational_hierarchy[0].id, "d9");
    }

    #[test]
    fn add_with_self_parent_falls_back_to_root() {
        let map = add_node(&empty_map(), "d1", "Loop", Some("d1"));
        assert_eq!(map.organizational_hierarchy.len(), 1);
        assert!(map.organizational_hierarchy[0].children.is_empty());
    }

    #[test]
    fn reinsert_under_own_descendant_does_not_cycle() {
        let map = empty_map();
        let map = add_node(&map, "a", "A", None);
        let map = add_node(&map, "b", "B", Some("a"));
        // "a" already exists and "b" sits inside its subtree.
        let map = add_node(&map, "a", "A again", Some("b"));

        assert_eq!(map.organizational_hierarchy.len(), 2);
        assert_eq!(count_nodes(&map.organizational_hierarchy), 3);
    }

    #[test]
    fn update_replaces_fields_but_keeps_children() {
        let map = empty_map();
        let map = add_node(&map, "d1", "Commercial", None);
        let map = add_node(&map, "d2", "Lending", Some("d1"));

        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "organizational_hierarchy",
                "operation": "update",
                "node_data": {"id": "d1", "name": "Commercial Banking Group", "type": "SEGMENT"},
            }),
            &map,
            NOW,
        )
        .map;

        let root = &map.organizational_hierarchy[0];
        assert_eq!(root.name, "Commercial Banking Group");
        assert_eq!(root.node_type, HierarchyNodeType::Segment);
        assert_eq!(root.children.len(), 1, "children must survive the update");
    }

    #[test]
    fn update_missing_node_is_noop() {
        let map = add_node(&empty_map(), "d1", "Commercial", None);
        let before = serde_json::to_value(&map.organizational_hierarchy).unwrap();

        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "organizational_hierarchy",
                "operation": "update",
                "node_data": {"id": "ghost", "name": "Nobody"},
            }),
            &map,
            NOW,
        )
        .map;

        assert_eq!(serde_json::to_value(&map.organizational_hierarchy).unwrap(), before);
    }

    #[test]
    fn remove_deletes_nested_node() {
        let map = empty_map();
        let map = add_node(&map, "d1", "Commercial", None);
        let map = add_node(&map, "d2", "Lending", Some("d1"));
        let map = add_node(&map, "d3", "Syndicated", Some("d2"));

        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "organizational_hierarchy",
                "operation": "remove",
                "node_data": {"id": "d2"},
            }),
            &map,
            NOW,
        )
        .map;

        // d2 and its subtree are gone.
        assert_eq!(count_nodes(&map.organizational_hierarchy), 1);
        assert!(map.organizational_hierarchy[0].children.is_empty());
    }

    #[test]
    fn sor_update_is_upsert_by_dimension() {
        let map = empty_map();
        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "sor_authority_map",
                "operation": "update",
                "node_data": {"dimension": "Cost Center", "system": "SAP"},
            }),
            &map,
            NOW,
        )
        .map;
        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "sor_authority_map",
                "operation": "update",
                "node_data": {"dimension": "Cost Center", "system": "Workday"},
            }),
            &map,
            NOW,
        )
        .map;

        assert_eq!(map.sor_authority_map.len(), 1);
        assert_eq!(map.sor_authority_map[0].dimension, "Cost Center");
        assert_eq!(map.sor_authority_map[0].system, "Workday");
    }

    #[test]
    fn sor_add_always_appends() {
        let map = empty_map();
        let input = json!({
            "dimension_type": "sor_authority_map",
            "operation": "add",
            "node_data": {"dimension": "Cost Center", "system": "SAP"},
        });
        let map = apply_tool("update_contour", &input, &map, NOW).map;
        let map = apply_tool("update_contour", &input, &map, NOW).map;
        assert_eq!(map.sor_authority_map.len(), 2);
    }

    #[test]
    fn conflict_add_generates_id_and_update_matches_by_id() {
        let map = empty_map();
        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "conflict_register",
                "operation": "add",
                "node_data": {
                    "dimension": "Cost Center",
                    "systems": [{"system": "SAP", "value": "50"}, {"system": "Oracle", "value": "47"}],
                },
            }),
            &map,
            NOW,
        )
        .map;
        let id = map.conflict_register[0].id.clone();
        assert!(!id.is_empty());
        assert_eq!(map.conflict_register[0].status, ConflictStatus::Open);

        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "conflict_register",
                "operation": "update",
                "node_data": {
                    "id": id,
                    "dimension": "Cost Center",
                    "status": "RESOLVED",
                    "resolution": "Workday wins",
                    "resolved_by": "Dana",
                },
            }),
            &map,
            NOW,
        )
        .map;
        assert_eq!(map.conflict_register.len(), 1);
        assert_eq!(map.conflict_register[0].status, ConflictStatus::Resolved);
        assert_eq!(map.conflict_register[0].resolution.as_deref(), Some("Workday wins"));
    }

    #[test]
    fn conflict_update_unknown_id_is_noop() {
        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "conflict_register",
                "operation": "update",
                "node_data": {"id": "ghost", "dimension": "Geo"},
            }),
            &empty_map(),
            NOW,
        )
        .map;
        assert!(map.conflict_register.is_empty());
    }

    #[test]
    fn vocabulary_is_append_only_regardless_of_operation() {
        let map = empty_map();
        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "vocabulary_map",
                "operation": "remove",
                "node_data": {"term": "BU", "meaning": "Business Unit"},
            }),
            &map,
            NOW,
        )
        .map;
        assert_eq!(map.vocabulary_map.len(), 1);
        assert_eq!(map.vocabulary_map[0].term, "BU");
    }

    #[test]
    fn priority_query_appended_with_defaults() {
        let map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "priority_queries",
                "operation": "add",
                "node_data": {"question": "Revenue by segment?", "priority": 1},
            }),
            &empty_map(),
            NOW,
        )
        .map;
        assert_eq!(map.priority_queries.len(), 1);
        assert_eq!(map.priority_queries[0].priority, 1);
        assert_eq!(map.priority_queries[0].frequency, "");
    }

    #[test]
    fn show_tools_are_display_only() {
        let map = empty_map();
        let outcome = apply_tool(
            "show_comparison",
            &json!({
                "dimension": "Cost Centers",
                "systems": [{"system": "SAP", "value": "50"}],
            }),
            &map,
            NOW,
        );
        assert!(outcome.state_action.is_none());
        match outcome.display.unwrap() {
            RichContent::Comparison { dimension, systems } => {
                assert_eq!(dimension, "Cost Centers");
                assert_eq!(systems[0].system, "SAP");
            }
            other => panic!("expected comparison, got {other:?}"),
        }
        // No structural change to the map.
        assert_eq!(outcome.map.metadata.completeness_score, 0);
        assert!(outcome.map.organizational_hierarchy.is_empty());

        let outcome = apply_tool(
            "show_table",
            &json!({"title": "T", "headers": ["a"], "rows": [["1"]]}),
            &map,
            NOW,
        );
        assert!(matches!(outcome.display, Some(RichContent::Table { .. })));

        let outcome = apply_tool(
            "show_hierarchy",
            &json!({"title": "Org", "root": {"name": "Acme"}}),
            &map,
            NOW,
        );
        assert!(matches!(outcome.display, Some(RichContent::Hierarchy { .. })));
    }

    #[test]
    fn park_item_synthesizes_description() {
        let outcome = apply_tool(
            "park_item",
            &json!({
                "dimension": "Geography",
                "question": "Who owns the region rollup?",
                "suggested_person": "Alex in FP&A",
            }),
            &empty_map(),
            NOW,
        );
        let task = &outcome.map.follow_up_tasks[0];
        assert_eq!(task.description, "Geography: Who owns the region rollup?");
        assert_eq!(task.assigned_to.as_deref(), Some("Alex in FP&A"));
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.created_at, NOW);
    }

    #[test]
    fn advance_section_signals_state_action_only() {
        let outcome = apply_tool(
            "advance_section",
            &json!({"summary": "captured top-level structure"}),
            &empty_map(),
            NOW,
        );
        assert_eq!(outcome.state_action, Some(StateAction::Advance));
        assert!(outcome.display.is_none());
    }

    #[test]
    fn unknown_tool_is_silent_noop() {
        let map = empty_map();
        let outcome = apply_tool("totally_made_up", &json!({"x": 1}), &map, NOW);
        assert!(outcome.display.is_none());
        assert!(outcome.state_action.is_none());
        assert!(outcome.map.organizational_hierarchy.is_empty());
        assert_eq!(outcome.map.metadata.completeness_score, 0);
    }

    #[test]
    fn malformed_input_defaults_instead_of_failing() {
        let map = apply_tool(
            "update_contour",
            &json!({"dimension_type": "organizational_hierarchy", "operation": "add"}),
            &empty_map(),
            NOW,
        )
        .map;
        assert_eq!(map.organizational_hierarchy.len(), 1);
        let node = &map.organizational_hierarchy[0];
        assert_eq!(node.name, "");
        assert_eq!(node.node_type, HierarchyNodeType::Division);
        assert_eq!(node.level, 0);
        assert!((node.confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(node.provenance, Provenance::StakeholderConfirmed);
        assert_eq!(node.source_system, "stakeholder");
    }

    // ── Completeness ────────────────────────────────────────────────

    #[test]
    fn full_map_scores_one_hundred() {
        let mut map = empty_map();
        // 5 hierarchy nodes (nested count)
        map = add_node(&map, "n1", "A", None);
        map = add_node(&map, "n2", "B", Some("n1"));
        map = add_node(&map, "n3", "C", Some("n1"));
        map = add_node(&map, "n4", "D", None);
        map = add_node(&map, "n5", "E", Some("n4"));
        // 3 SOR entries
        for (dim, sys) in [("Cost Center", "SAP"), ("Legal Entity", "Workday"), ("Region", "Oracle")] {
            map = apply_tool(
                "update_contour",
                &json!({
                    "dimension_type": "sor_authority_map",
                    "operation": "add",
                    "node_data": {"dimension": dim, "system": sys},
                }),
                &map,
                NOW,
            )
            .map;
        }
        // 1 management node
        map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "management_overlay",
                "operation": "add",
                "node_data": {"id": "m1", "name": "Board View"},
            }),
            &map,
            NOW,
        )
        .map;
        // 3 vocabulary entries
        for term in ["BU", "CC", "LE"] {
            map = apply_tool(
                "update_contour",
                &json!({
                    "dimension_type": "vocabulary_map",
                    "operation": "add",
                    "node_data": {"term": term, "meaning": term},
                }),
                &map,
                NOW,
            )
            .map;
        }
        // 3 priority queries
        for q in ["q1", "q2", "q3"] {
            map = apply_tool(
                "update_contour",
                &json!({
                    "dimension_type": "priority_queries",
                    "operation": "add",
                    "node_data": {"question": q},
                }),
                &map,
                NOW,
            )
            .map;
        }
        // 1 follow-up task; zero conflicts
        let outcome = apply_tool(
            "park_item",
            &json!({"dimension": "Geo", "question": "owner?"}),
            &map,
            NOW,
        );
        map = outcome.map;

        assert_eq!(completeness(&map), 100);
    }

    #[test]
    fn partial_hierarchy_scores_linearly() {
        let map = add_node(&empty_map(), "n1", "A", None);
        // 1 of 5 nodes → 6 of 30, plus 15 for zero conflicts.
        assert_eq!(completeness(&map), 21);
    }

    #[test]
    fn unresolved_conflicts_reduce_score() {
        let mut map = empty_map();
        map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "conflict_register",
                "operation": "add",
                "node_data": {"dimension": "Cost Center"},
            }),
            &map,
            NOW,
        )
        .map;
        // One open conflict of one: conflict weight contributes 0.
        assert_eq!(completeness(&map), 0);

        let id = map.conflict_register[0].id.clone();
        map = apply_tool(
            "update_contour",
            &json!({
                "dimension_type": "conflict_register",
                "operation": "update",
                "node_data": {"id": id, "dimension": "Cost Center", "status": "RESOLVED"},
            }),
            &map,
            NOW,
        )
        .map;
        assert_eq!(completeness(&map), 15);
    }

    #[test]
    fn score_is_pure_function_of_content() {
        // Two maps with identical content built along different histories.
        let a = {
            let m = add_node(&empty_map(), "x", "X", None);
            add_node(&m, "y", "Y", Some("x"))
        };
        let b = {
            let m = add_node(&empty_map(), "decoy", "Z", None);
            let m = apply_tool(
                "update_contour",
                &json!({
                    "dimension_type": "organizational_hierarchy",
                    "operation": "remove",
                    "node_data": {"id": "decoy"},
                }),
                &m,
                NOW,
            )
            .map;
            let m = add_node(&m, "x", "X", None);
            add_node(&m, "y", "Y", Some("x"))
        };
        assert_eq!(completeness(&a), completeness(&b));
    }

    #[test]
    fn nested_nodes_count_toward_hierarchy_weight() {
        let mut map = empty_map();
        map = add_node(&map, "r", "Root", None);
        for i in 0..4 {
            map = add_node(&map, &format!("c{i}"), "Child", Some("r"));
        }
        // 5 total nodes (1 root + 4 nested) → full hierarchy weight + conflicts weight.
        assert_eq!(completeness(&map), 45);
    }
}
