//! Prompt context builder: composes the layered instruction bundle sent
//! with every model invocation.

pub mod sections;
pub mod summary;

use std::sync::Arc;

use contour_core::context::{BlockLabel, Stability, SystemBlock};
use contour_core::contour::ContourMap;
use contour_core::session::{SectionId, Session};

use crate::lookup::SystemLookup;

/// Layer 1: fixed identity and behavior text. No per-session variance.
const IDENTITY: &str = "\
You are an onboarding interviewer. Your job is to learn how an enterprise is \
organized by interviewing a stakeholder, building a structured contour map of \
their organizational and systems-of-record landscape.

CORE BEHAVIORS:
- Ask ONE question at a time. Max two sentences before asking for input.
- Show data and ask for confirmation rather than asking open-ended questions \
whenever possible.
- Never show internal ids, field names, or confidence scores to the stakeholder.
- Speak the stakeholder's business language and mirror their vocabulary.
- When stuck on a topic for more than two exchanges, offer to park it and move on.

TOOL USAGE:
- Call update_contour immediately when the stakeholder provides organizational \
data — if they told you about it, record it now.
- Use show_comparison for cross-system discrepancies, show_hierarchy for trees, \
show_table for tabular data.
- Use park_item when a topic stalls; use advance_section the moment the current \
section's exit conditions are met or the stakeholder clearly wants to move on.
- You may call several tools in a single response.

WHAT YOU NEVER DO:
- Never invent organizational data; only record what the stakeholder confirms.
- Never ask the same question more than twice — park it and move forward.
- Never get stuck re-confirming: once a hierarchy has been shown and the \
stakeholder responds with anything other than a correction, treat it as \
confirmed.";

/// Builds the system blocks for one turn. The session layer and section
/// layer are derived fresh from the current map every time.
pub struct ContextBuilder {
    lookup: Option<Arc<SystemLookup>>,
}

impl ContextBuilder {
    pub fn new(lookup: Option<Arc<SystemLookup>>) -> Self {
        Self { lookup }
    }

    pub async fn build(
        &self,
        session: &Session,
        current_section: SectionId,
        map: &ContourMap,
    ) -> Vec<SystemBlock> {
        let mut blocks = vec![
            SystemBlock {
                content: IDENTITY.to_string(),
                stability: Stability::Stable,
                label: BlockLabel::Identity,
            },
            SystemBlock {
                content: session_layer(session, map),
                stability: Stability::Volatile,
                label: BlockLabel::SessionContext,
            },
        ];

        if let Some(lookup) = &self.lookup {
            let live = lookup.live_context(&session.customer_id).await;
            if !live.is_empty() {
                blocks.push(SystemBlock {
                    content: format!("LIVE SYSTEM DATA:\n\n{}", live.render()),
                    stability: Stability::Volatile,
                    label: BlockLabel::LiveSystemData,
                });
            }
        }

        blocks.push(SystemBlock {
            content: sections::guidance(current_section, map),
            stability: Stability::Volatile,
            label: BlockLabel::SectionGuidance,
        });

        blocks
    }
}

fn session_layer(session: &Session, map: &ContourMap) -> String {
    let mut text = format!(
        "SESSION CONTEXT:\n- Customer: {}\n- Stakeholder: {} ({})",
        session.customer_name, session.stakeholder_name, session.stakeholder_role
    );

    if let Some(brief) = &session.intel_brief {
        text.push_str(&format!("\n\nPRE-MEETING INTELLIGENCE:\n{brief}"));
    }

    if !session.premeet_artifacts.is_empty() {
        text.push_str(&format!(
            "\n\nPre-meeting artifacts received: {}",
            session.premeet_artifacts.join(", ")
        ));
    }

    text.push_str(&format!("\n\nCONFIRMED SO FAR:\n{}", summary::confirmed_items(map)));
    text.push_str(&format!("\n\nUNRESOLVED ITEMS:\n{}", summary::unresolved_items(map)));

    let uploads = summary::uploaded_files(map);
    if !uploads.is_empty() {
        text.push_str(&format!("\n\nUPLOADED FILES:\n{uploads}"));
    }

    text
}
