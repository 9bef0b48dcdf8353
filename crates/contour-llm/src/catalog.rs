//! The interview tool catalog: the schemas offered to the model each turn.

use serde_json::json;

use contour_core::tools::ToolDefinition;

/// All tools available to the interviewer.
pub fn interview_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "update_contour".into(),
            description: "Add or modify a node in the enterprise contour map. Use this whenever \
                          the stakeholder confirms organizational data."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dimension_type": {
                        "type": "string",
                        "enum": [
                            "organizational_hierarchy",
                            "sor_authority_map",
                            "conflict_register",
                            "management_overlay",
                            "vocabulary_map",
                            "priority_queries"
                        ],
                        "description": "Which section of the contour map to update"
                    },
                    "operation": {
                        "type": "string",
                        "enum": ["add", "update", "remove"],
                        "description": "What to do with the node"
                    },
                    "node_data": {
                        "type": "object",
                        "description": "The data for the node (shape depends on dimension_type)"
                    },
                    "confidence": {
                        "type": "number",
                        "minimum": 0,
                        "maximum": 1,
                        "description": "Confidence score (0-1)"
                    },
                    "provenance": {
                        "type": "string",
                        "enum": [
                            "PUBLIC_FILING",
                            "SYSTEM_EXTRACTED",
                            "STAKEHOLDER_CONFIRMED",
                            "STAKEHOLDER_FILE",
                            "INFERRED",
                            "UNVERIFIED"
                        ],
                        "description": "Source of this data"
                    }
                },
                "required": ["dimension_type", "operation", "node_data"]
            }),
        },
        ToolDefinition {
            name: "show_comparison".into(),
            description: "Display a side-by-side comparison of values from different systems for \
                          a given dimension. Use when there are conflicts to resolve."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dimension": {
                        "type": "string",
                        "description": "The dimension being compared (e.g., \"Cost Centers\")"
                    },
                    "systems": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "system": {"type": "string"},
                                "value": {"type": "string"}
                            },
                            "required": ["system", "value"]
                        },
                        "description": "The system values to compare"
                    }
                },
                "required": ["dimension", "systems"]
            }),
        },
        ToolDefinition {
            name: "show_hierarchy".into(),
            description: "Display an organizational tree view. Use to present or confirm \
                          hierarchical structures."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Title for the hierarchy display"
                    },
                    "root": {
                        "type": "object",
                        "description": "Root node with name and children array. Each child has \
                                        name and optional children."
                    }
                },
                "required": ["title", "root"]
            }),
        },
        ToolDefinition {
            name: "show_table".into(),
            description: "Display a data table. Use for tabular data like SOR mappings or \
                          priority queries."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Title for the table"
                    },
                    "headers": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Column headers"
                    },
                    "rows": {
                        "type": "array",
                        "items": {"type": "array", "items": {"type": "string"}},
                        "description": "Table rows"
                    }
                },
                "required": ["title", "headers", "rows"]
            }),
        },
        ToolDefinition {
            name: "park_item".into(),
            description: "Mark an unresolved topic to revisit later. Use when the stakeholder \
                          cannot answer or needs to check with someone else."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dimension": {
                        "type": "string",
                        "description": "The dimension or topic being parked"
                    },
                    "question": {
                        "type": "string",
                        "description": "The unresolved question"
                    },
                    "suggested_person": {
                        "type": "string",
                        "description": "Who might be able to answer this"
                    }
                },
                "required": ["dimension", "question"]
            }),
        },
        ToolDefinition {
            name: "advance_section".into(),
            description: "Complete the current section and move to the next one. Call this when \
                          exit conditions for the current section are met."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "summary": {
                        "type": "string",
                        "description": "Brief summary of what was captured in this section"
                    }
                },
                "required": ["summary"]
            }),
        },
        ToolDefinition {
            name: "process_file".into(),
            description: "Look up the extracted contents of a previously uploaded file. Use when \
                          the stakeholder refers to a document they provided."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_id": {
                        "type": "string",
                        "description": "The ID of the uploaded file"
                    },
                    "analysis_focus": {
                        "type": "string",
                        "description": "Optional focus area (e.g., \"cost centers\")"
                    }
                },
                "required": ["file_id"]
            }),
        },
        ToolDefinition {
            name: "lookup_system_data".into(),
            description: "Query discovered data about the customer's systems, connections, or \
                          existing graph. Use to cross-reference what the stakeholder says with \
                          system evidence."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query_type": {
                        "type": "string",
                        "enum": ["systems", "connections", "dimension_data", "graph_summary"],
                        "description": "What type of data to look up"
                    },
                    "system_name": {
                        "type": "string",
                        "description": "Optional system name to filter by"
                    },
                    "dimension": {
                        "type": "string",
                        "description": "Optional dimension name for dimension_data queries"
                    }
                },
                "required": ["query_type"]
            }),
        },
    ]
}
