//! Per-section guidance: the third instruction layer, selected by the
//! session's current section and adapted to what the map already holds.

use contour_core::contour::{ConflictStatus, ContourMap};
use contour_core::session::SectionId;

use crate::contour::count_nodes;

pub fn guidance(section: SectionId, map: &ContourMap) -> String {
    match section {
        SectionId::UniverseScan => universe_scan(),
        SectionId::PremeetRequest => premeet_request(),
        SectionId::BusinessOverview => business_overview(map),
        SectionId::SystemAuthority => system_authority(map),
        SectionId::DimensionalWalkthrough => dimensional_walkthrough(map),
        SectionId::ManagementReporting => management_reporting(map),
        SectionId::PriorityQueries => priority_queries(map),
    }
}

fn universe_scan() -> String {
    "SECTION 0A: UNIVERSE SCAN (automated — no stakeholder interaction)\n\n\
     Public intelligence about the customer is gathered before the interview. \
     If a stakeholder is connected during this phase, acknowledge them and \
     explain you are still preparing. Call advance_section once the brief is \
     ready."
        .to_string()
}

fn premeet_request() -> String {
    "SECTION 0B: PRE-MEETING REQUEST (automated)\n\n\
     A preparation request is sent to the stakeholder asking for helpful \
     documents: chart of accounts, org chart, system inventory, recent \
     restructuring notes. Uploaded documents become interview context. If the \
     stakeholder is already present and wants to begin, advance straight to \
     Section 1."
        .to_string()
}

fn business_overview(map: &ContourMap) -> String {
    let opening = if map.organizational_hierarchy.is_empty() {
        "OPENING: \"Let me start with the big picture. How is your company \
         organized at the highest level — by geography, by product line, by \
         function, or some combination?\""
    } else {
        "We already hold some organizational data. Present it with \
         show_hierarchy and ask whether it reflects how they think about the \
         business."
    };

    format!(
        "SECTION 1: BUSINESS OVERVIEW (target: 10-15 minutes)\n\n\
         GOAL: capture the top-level organizational structure in the \
         stakeholder's own vocabulary.\n\n\
         {opening}\n\n\
         CAPTURE: division and business-unit names and how they nest; whether \
         the structure is geographic, functional, product-line, or hybrid; \
         recent or upcoming reorganizations; the words they use internally \
         (record differences in the vocabulary map).\n\n\
         BEHAVIORS: if they give a flat list, probe how it rolls up. Reflect \
         structures back with show_hierarchy so they can correct visually. \
         Record each confirmed node with update_contour.\n\n\
         EXIT: top-level structure captured at least two levels deep, \
         structure type identified, and the stakeholder has confirmed it or \
         moved on. Then call advance_section. If they cannot describe the \
         full structure, park the gaps and advance."
    )
}

fn system_authority(map: &ContourMap) -> String {
    let opening = if map.sor_authority_map.is_empty() {
        "OPENING: \"Now let's talk about your systems. For organizational \
         structure and reporting hierarchies, which system is the source of \
         truth?\""
    } else {
        "Some system-of-record mappings are already held. Present them with \
         show_table and ask the stakeholder to confirm or correct."
    };

    format!(
        "SECTION 2: SYSTEM AUTHORITY (target: 5-10 minutes)\n\n\
         GOAL: identify the source of record for each organizational \
         dimension.\n\n\
         {opening}\n\n\
         CAPTURE: for each major dimension, the owning system; known \
         disagreements between systems; data flow direction; manual \
         spreadsheet bridges.\n\n\
         BEHAVIORS: go dimension by dimension. When a conflict surfaces, use \
         show_comparison to display the discrepancy and log it in the \
         conflict register. Record SOR entries with update_contour. When \
         nobody owns a dimension, park_item with a note about who might \
         know.\n\n\
         EXIT: sources of record identified for at least legal entity, cost \
         center, and department, with known conflicts logged."
    )
}

fn dimensional_walkthrough(map: &ContourMap) -> String {
    let node_count = count_nodes(&map.organizational_hierarchy);
    let open_conflicts = map
        .conflict_register
        .iter()
        .filter(|c| c.status == ConflictStatus::Open)
        .count();

    let data_note = if node_count > 0 {
        format!(
            "{node_count} hierarchy nodes are already captured. Use \
             show_hierarchy and show_comparison to present what is known and \
             ask for corrections."
        )
    } else {
        "No system-extracted data is held yet. Ask the stakeholder to \
         describe each dimension, or offer to read an uploaded file."
            .to_string()
    };

    let conflict_note = if open_conflicts > 0 {
        format!(
            "\n\nThere are {open_conflicts} open conflicts. Prioritize them — \
             one show_comparison each."
        )
    } else {
        String::new()
    };

    format!(
        "SECTION 3: DIMENSIONAL WALKTHROUGH (target: 25-30 minutes)\n\n\
         GOAL: validate every organizational dimension against discovered \
         data. This is the longest and most important section.\n\n\
         Walk the dimensions in order: legal entity, division, cost center, \
         department, geography, profit center, segment.\n\n\
         {data_note}{conflict_note}\n\n\
         BEHAVIORS: for each dimension show what is held, highlight matches \
         and conflicts, and record confirmations with update_contour. Use \
         lookup_system_data to cross-reference claims against discovered \
         evidence. Park dimensions the stakeholder cannot speak to.\n\n\
         EXIT: every dimension either validated or explicitly parked."
    )
}

fn management_reporting(map: &ContourMap) -> String {
    let overlay_note = if count_nodes(&map.management_overlay) > 0 {
        "\n\nSome management-overlay data is already held. Present it and ask \
         whether it is current."
    } else {
        ""
    };

    format!(
        "SECTION 4: MANAGEMENT REPORTING (target: 10 minutes)\n\n\
         GOAL: capture how leadership actually sees the business — this often \
         differs from the system-of-record structure.\n\n\
         OPENING: \"When your CFO presents to the board, what does the \
         management P&L look like? The same divisions we discussed, or sliced \
         differently?\"{overlay_note}\n\n\
         CAPTURE: the management hierarchy into management_overlay; the \
         board-level metrics and their groupings; manual adjustments or \
         reclassifications done outside the systems.\n\n\
         BEHAVIORS: contrast the management view with the operational \
         structure. Show both with show_hierarchy when they differ.\n\n\
         EXIT: management hierarchy captured (confirm explicitly even when it \
         matches the operational structure), key metrics identified, manual \
         bridges noted. Park with a pointer to FP&A when the stakeholder has \
         no visibility."
    )
}

fn priority_queries(map: &ContourMap) -> String {
    let existing_note = if map.priority_queries.is_empty() {
        String::new()
    } else {
        format!(
            "\n\n{} priority queries are already captured. Review them and \
             ask what is missing.",
            map.priority_queries.len()
        )
    };

    format!(
        "SECTION 5: PAIN POINTS & PRIORITY QUERIES (target: 10 minutes)\n\n\
         GOAL: discover what to optimize first and which reporting questions \
         to validate against.\n\n\
         OPENING: \"Last section — what reporting questions take too long to \
         answer, or break every quarter-end?\"{existing_note}\n\n\
         CAPTURE: the top pain-point questions with frequency and root cause; \
         the one report that matters most, explicitly.\n\n\
         BEHAVIORS: ask for concrete examples, probe whether the pain is \
         data, tooling, or both, and reflect the ranked list back with \
         show_table. Record each with update_contour.\n\n\
         EXIT: at least three priority queries captured and the stakeholder \
         has had the chance to add anything missed. Close with a summary of \
         the whole session, then call advance_section — this completes the \
         interview."
    )
}
