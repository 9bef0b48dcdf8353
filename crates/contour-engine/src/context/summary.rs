//! Derived summaries of the contour map for the session context layer.
//! Regenerated every turn — never cached across turns.

use contour_core::contour::{ConflictStatus, ContourMap, HierarchyNode, TaskStatus};

pub const NOTHING_CONFIRMED: &str = "Nothing confirmed yet.";
pub const NO_UNRESOLVED: &str = "No unresolved items.";

const MAX_LISTED_NAMES: usize = 10;

/// Human-readable lines for everything the stakeholder has confirmed so far.
/// An empty map renders the explicit sentinel, so the instruction layer never
/// silently omits state.
pub fn confirmed_items(map: &ContourMap) -> String {
    let mut parts = Vec::new();

    let names = flatten_names(&map.organizational_hierarchy);
    if !names.is_empty() {
        let listed = names
            .iter()
            .take(MAX_LISTED_NAMES)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let suffix = if names.len() > MAX_LISTED_NAMES {
            format!(" (+{} more)", names.len() - MAX_LISTED_NAMES)
        } else {
            String::new()
        };
        parts.push(format!("Org structure: {listed}{suffix}"));
    }

    if !map.sor_authority_map.is_empty() {
        let entries = map
            .sor_authority_map
            .iter()
            .map(|e| format!("{} → {}", e.dimension, e.system))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Systems of record: {entries}"));
    }

    let overlay_count = crate::contour::count_nodes(&map.management_overlay);
    if overlay_count > 0 {
        parts.push(format!("Management overlay: {overlay_count} nodes captured"));
    }

    if !map.vocabulary_map.is_empty() {
        let terms = map
            .vocabulary_map
            .iter()
            .map(|v| v.term.clone())
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Vocabulary: {terms}"));
    }

    if !map.priority_queries.is_empty() {
        parts.push(format!("Priority queries: {} captured", map.priority_queries.len()));
    }

    if parts.is_empty() {
        NOTHING_CONFIRMED.to_string()
    } else {
        parts.join("\n")
    }
}

/// Open conflicts and open follow-ups; sentinel when there are none.
pub fn unresolved_items(map: &ContourMap) -> String {
    let mut parts = Vec::new();

    let open_conflicts: Vec<&str> = map
        .conflict_register
        .iter()
        .filter(|c| c.status == ConflictStatus::Open)
        .map(|c| c.dimension.as_str())
        .collect();
    if !open_conflicts.is_empty() {
        parts.push(format!("Open conflicts: {}", open_conflicts.join(", ")));
    }

    let open_tasks: Vec<&str> = map
        .follow_up_tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Open)
        .map(|t| t.description.as_str())
        .collect();
    if !open_tasks.is_empty() {
        parts.push(format!("Parked items: {}", open_tasks.join("; ")));
    }

    if parts.is_empty() {
        NO_UNRESOLVED.to_string()
    } else {
        parts.join("\n")
    }
}

/// Filenames with mime types; empty string when nothing was uploaded.
pub fn uploaded_files(map: &ContourMap) -> String {
    map.uploaded_artifacts
        .iter()
        .map(|a| format!("{} ({})", a.filename, a.mime_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every node name in DFS order, without recursion.
fn flatten_names(forest: &[HierarchyNode]) -> Vec<String> {
    let mut names = Vec::new();
    let mut stack: Vec<&HierarchyNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        names.push(node.name.clone());
        for child in node.children.iter().rev() {
            stack.push(child);
        }
    }
    names
}
