//! Session identity and the conversation state worked on by the section
//! state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contour::ContourMap;
use crate::ids::{CustomerId, SessionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    IntelGathering,
    PremeetSent,
    Ready,
    InProgress,
    Paused,
    Complete,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::IntelGathering => "INTEL_GATHERING",
            Self::PremeetSent => "PREMEET_SENT",
            Self::Ready => "READY",
            Self::InProgress => "IN_PROGRESS",
            Self::Paused => "PAUSED",
            Self::Complete => "COMPLETE",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTEL_GATHERING" => Ok(Self::IntelGathering),
            "PREMEET_SENT" => Ok(Self::PremeetSent),
            "READY" => Ok(Self::Ready),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETE" => Ok(Self::Complete),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// Interview sections in their fixed order. The two automated sections run
/// before the stakeholder-facing interview; `Ord` follows interview order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionId {
    #[serde(rename = "0A")]
    UniverseScan,
    #[serde(rename = "0B")]
    PremeetRequest,
    #[serde(rename = "1")]
    BusinessOverview,
    #[serde(rename = "2")]
    SystemAuthority,
    #[serde(rename = "3")]
    DimensionalWalkthrough,
    #[serde(rename = "4")]
    ManagementReporting,
    #[serde(rename = "5")]
    PriorityQueries,
}

pub const SECTION_ORDER: [SectionId; 7] = [
    SectionId::UniverseScan,
    SectionId::PremeetRequest,
    SectionId::BusinessOverview,
    SectionId::SystemAuthority,
    SectionId::DimensionalWalkthrough,
    SectionId::ManagementReporting,
    SectionId::PriorityQueries,
];

/// The five stakeholder-facing sections (excludes the automated pair).
pub const INTERVIEW_SECTIONS: [SectionId; 5] = [
    SectionId::BusinessOverview,
    SectionId::SystemAuthority,
    SectionId::DimensionalWalkthrough,
    SectionId::ManagementReporting,
    SectionId::PriorityQueries,
];

impl SectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniverseScan => "0A",
            Self::PremeetRequest => "0B",
            Self::BusinessOverview => "1",
            Self::SystemAuthority => "2",
            Self::DimensionalWalkthrough => "3",
            Self::ManagementReporting => "4",
            Self::PriorityQueries => "5",
        }
    }

    pub fn index(&self) -> usize {
        SECTION_ORDER.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0A" => Ok(Self::UniverseScan),
            "0B" => Ok(Self::PremeetRequest),
            "1" => Ok(Self::BusinessOverview),
            "2" => Ok(Self::SystemAuthority),
            "3" => Ok(Self::DimensionalWalkthrough),
            "4" => Ok(Self::ManagementReporting),
            "5" => Ok(Self::PriorityQueries),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionStatus {
    NotStarted,
    InProgress,
    Complete,
    Parked,
}

/// Working set of the section state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationState {
    pub status: SessionStatus,
    pub current_section: SectionId,
    pub section_status: BTreeMap<SectionId, SectionStatus>,
}

impl ConversationState {
    /// The interview begins with its first stakeholder-facing section active;
    /// the automated pre-interview sections are handled by collaborators
    /// before this core takes over.
    pub fn initial() -> Self {
        let mut section_status = BTreeMap::new();
        for section in SECTION_ORDER {
            section_status.insert(section, SectionStatus::NotStarted);
        }
        section_status.insert(SectionId::BusinessOverview, SectionStatus::InProgress);

        Self {
            status: SessionStatus::InProgress,
            current_section: SectionId::BusinessOverview,
            section_status,
        }
    }

    pub fn status_of(&self, section: SectionId) -> SectionStatus {
        self.section_status
            .get(&section)
            .copied()
            .unwrap_or(SectionStatus::NotStarted)
    }
}

/// One interview instance: identity, conversation state, and the owned map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub stakeholder_name: String,
    pub stakeholder_role: String,
    pub status: SessionStatus,
    pub current_section: SectionId,
    pub section_status: BTreeMap<SectionId, SectionStatus>,
    pub intel_brief: Option<String>,
    pub premeet_artifacts: Vec<String>,
    pub contour_map: ContourMap,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    pub fn conversation_state(&self) -> ConversationState {
        ConversationState {
            status: self.status,
            current_section: self.current_section,
            section_status: self.section_status.clone(),
        }
    }
}
