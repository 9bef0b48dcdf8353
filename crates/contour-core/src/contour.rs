//! The contour map: the accumulated truth snapshot of a customer's
//! organizational and systems-of-record landscape, owned by its session.

use serde::{Deserialize, Serialize};

pub const CONTOUR_VERSION: &str = "0.1";
pub const APPROVED_VERSION: &str = "1.0-approved";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContourMap {
    pub organizational_hierarchy: Vec<HierarchyNode>,
    pub sor_authority_map: Vec<SorEntry>,
    pub conflict_register: Vec<Conflict>,
    pub management_overlay: Vec<HierarchyNode>,
    pub vocabulary_map: Vec<VocabularyEntry>,
    pub priority_queries: Vec<PriorityQuery>,
    pub follow_up_tasks: Vec<FollowUpTask>,
    pub uploaded_artifacts: Vec<UploadedArtifact>,
    pub metadata: ContourMetadata,
}

impl ContourMap {
    /// Empty map stamped with the given creation time (RFC 3339).
    pub fn empty(now: &str) -> Self {
        Self {
            organizational_hierarchy: Vec::new(),
            sor_authority_map: Vec::new(),
            conflict_register: Vec::new(),
            management_overlay: Vec::new(),
            vocabulary_map: Vec::new(),
            priority_queries: Vec::new(),
            follow_up_tasks: Vec::new(),
            uploaded_artifacts: Vec::new(),
            metadata: ContourMetadata {
                version: CONTOUR_VERSION.to_string(),
                created: now.to_string(),
                last_updated: now.to_string(),
                completeness_score: 0,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: HierarchyNodeType,
    pub level: i32,
    pub parent_id: Option<String>,
    pub children: Vec<HierarchyNode>,
    pub source_system: String,
    pub source_field: String,
    pub confidence: f64,
    pub provenance: Provenance,
    pub notes: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyNodeType {
    LegalEntity,
    Division,
    Department,
    CostCenter,
    ProfitCenter,
    Region,
    Segment,
}

/// How a fact was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    PublicFiling,
    SystemExtracted,
    StakeholderConfirmed,
    StakeholderFile,
    Inferred,
    Unverified,
}

/// One authoritative-system entry per organizational dimension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SorEntry {
    pub dimension: String,
    pub system: String,
    pub confidence: f64,
    pub confirmed_by: Option<String>,
    pub conflicts: Vec<String>,
    pub notes: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    pub dimension: String,
    pub systems: Vec<SystemValue>,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
    pub status: ConflictStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemValue {
    pub system: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictStatus {
    Open,
    Resolved,
    Parked,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub term: String,
    pub meaning: String,
    pub context: String,
    pub system_equivalent: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriorityQuery {
    pub id: String,
    pub question: String,
    pub business_context: String,
    pub frequency: String,
    pub current_pain: String,
    pub priority: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowUpTask {
    pub id: String,
    pub description: String,
    pub assigned_to: Option<String>,
    pub section: String,
    pub status: TaskStatus,
    pub created_at: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Open,
    Complete,
}

/// Metadata and extracted data for a file ingested by the upload collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedArtifact {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub extracted_data: serde_json::Value,
    pub section: String,
    pub uploaded_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContourMetadata {
    pub version: String,
    pub created: String,
    pub last_updated: String,
    pub completeness_score: u32,
}
