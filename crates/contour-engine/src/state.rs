//! Section state machine: a pure reducer over the conversation state.

use serde::{Deserialize, Serialize};

use contour_core::session::{
    ConversationState, SectionId, SectionStatus, SessionStatus, INTERVIEW_SECTIONS, SECTION_ORDER,
};

/// Actions dispatched by the model (via tools) or by the system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateAction {
    Advance,
    Jump { target: SectionId },
    Park,
    Resume { target: SectionId },
    Pause,
    Complete,
}

/// Apply an action, producing the next state. No I/O, no hidden inputs.
pub fn reduce(state: &ConversationState, action: &StateAction) -> ConversationState {
    let mut next = state.clone();

    match action {
        StateAction::Advance => {
            next.section_status
                .insert(next.current_section, SectionStatus::Complete);

            match next_open_section(&next, next.current_section) {
                Some(section) => {
                    next.current_section = section;
                    next.section_status.insert(section, SectionStatus::InProgress);
                }
                None => {
                    next.status = SessionStatus::Complete;
                }
            }
        }

        StateAction::Jump { target } => {
            if *target != next.current_section {
                // The interrupted section keeps its status, so it stays resumable.
                next.current_section = *target;
                if next.status_of(*target) == SectionStatus::NotStarted {
                    next.section_status.insert(*target, SectionStatus::InProgress);
                }
            }
        }

        StateAction::Park => {
            next.section_status
                .insert(next.current_section, SectionStatus::Parked);

            if let Some(section) = next_open_section(&next, next.current_section) {
                next.current_section = section;
                next.section_status.insert(section, SectionStatus::InProgress);
            }
        }

        StateAction::Resume { target } => {
            if next.status_of(*target) == SectionStatus::Parked {
                next.current_section = *target;
                next.section_status.insert(*target, SectionStatus::InProgress);
            }
        }

        StateAction::Pause => {
            next.status = SessionStatus::Paused;
        }

        StateAction::Complete => {
            next.section_status
                .insert(next.current_section, SectionStatus::Complete);
            next.status = SessionStatus::Complete;
        }
    }

    next
}

/// First section after `from` (in fixed order) that is not yet COMPLETE.
fn next_open_section(state: &ConversationState, from: SectionId) -> Option<SectionId> {
    SECTION_ORDER
        .iter()
        .skip(from.index() + 1)
        .copied()
        .find(|s| state.status_of(*s) != SectionStatus::Complete)
}

/// Share of the stakeholder-facing sections that are COMPLETE, 0-100.
pub fn completion_percentage(state: &ConversationState) -> u32 {
    let completed = INTERVIEW_SECTIONS
        .iter()
        .filter(|s| state.status_of(**s) == SectionStatus::Complete)
        .count();
    ((completed as f64 / INTERVIEW_SECTIONS.len() as f64) * 100.0).round() as u32
}
