use chrono::Utc;
use tracing::instrument;

use contour_core::contour::ContourMap;
use contour_core::ids::{CustomerId, SessionId};
use contour_core::session::{ConversationState, Session};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Identity fields required to start an interview.
#[derive(Clone, Debug)]
pub struct CreateSessionInput {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub stakeholder_name: String,
    pub stakeholder_role: String,
}

const SELECT_COLUMNS: &str = "id, customer_id, customer_name, stakeholder_name, stakeholder_role,
        status, current_section, section_status, contour_map, intel_brief,
        premeet_artifacts, created_at, updated_at";

pub struct SessionRepo {
    db: Database,
}

impl SessionRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a session with an empty contour map and the initial
    /// conversation state.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub fn create(&self, input: CreateSessionInput) -> Result<Session, StoreError> {
        let id = SessionId::new();
        let now = Utc::now().to_rfc3339();
        let state = ConversationState::initial();
        let map = ContourMap::empty(&now);

        let section_status_json = serde_json::to_string(&state.section_status)?;
        let map_json = serde_json::to_string(&map)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, customer_id, customer_name, stakeholder_name,
                     stakeholder_role, status, current_section, section_status, contour_map,
                     premeet_artifacts, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, '[]', ?10, ?10)",
                rusqlite::params![
                    id.as_str(),
                    input.customer_id.as_str(),
                    input.customer_name,
                    input.stakeholder_name,
                    input.stakeholder_role,
                    state.status.to_string(),
                    state.current_section.as_str(),
                    section_status_json,
                    map_json,
                    now,
                ],
            )?;
            Ok(())
        })?;

        Ok(Session {
            id,
            customer_id: input.customer_id,
            customer_name: input.customer_name,
            stakeholder_name: input.stakeholder_name,
            stakeholder_role: input.stakeholder_role,
            status: state.status,
            current_section: state.current_section,
            section_status: state.section_status,
            intel_brief: None,
            premeet_artifacts: Vec::new(),
            contour_map: map,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a session by ID.
    #[instrument(skip(self), fields(session_id = %id))]
    pub fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM sessions WHERE id = ?1"))?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_session(row),
                None => Err(StoreError::NotFound(format!("session {id}"))),
            }
        })
    }

    /// List all sessions, newest first.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Session>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM sessions ORDER BY created_at DESC, id DESC"
            ))?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_session(row)?);
            }
            Ok(results)
        })
    }

    /// Write back the mutable turn state: contour map, section, statuses.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn update(&self, session: &Session) -> Result<(), StoreError> {
        let section_status_json = serde_json::to_string(&session.section_status)?;
        let map_json = serde_json::to_string(&session.contour_map)?;
        let premeet_json = serde_json::to_string(&session.premeet_artifacts)?;
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE sessions SET status = ?1, current_section = ?2, section_status = ?3,
                     contour_map = ?4, intel_brief = ?5, premeet_artifacts = ?6, updated_at = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    session.status.to_string(),
                    session.current_section.as_str(),
                    section_status_json,
                    map_json,
                    session.intel_brief,
                    premeet_json,
                    now,
                    session.id.as_str(),
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("session {}", session.id)));
            }
            Ok(())
        })
    }

    /// Replace only the contour map (used by the approval endpoint).
    #[instrument(skip(self, map), fields(session_id = %id))]
    pub fn update_contour_map(&self, id: &SessionId, map: &ContourMap) -> Result<(), StoreError> {
        let map_json = serde_json::to_string(map)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE sessions SET contour_map = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![map_json, now, id.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("session {id}")));
            }
            Ok(())
        })
    }

    /// Attach the pre-meeting intelligence brief.
    #[instrument(skip(self, brief), fields(session_id = %id))]
    pub fn set_intel_brief(&self, id: &SessionId, brief: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE sessions SET intel_brief = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![brief, now, id.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("session {id}")));
            }
            Ok(())
        })
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session, StoreError> {
    let status_str: String = row_helpers::get(row, 5, "sessions", "status")?;
    let section_str: String = row_helpers::get(row, 6, "sessions", "current_section")?;
    let section_status_raw: String = row_helpers::get(row, 7, "sessions", "section_status")?;
    let map_raw: String = row_helpers::get(row, 8, "sessions", "contour_map")?;
    let premeet_raw: String = row_helpers::get(row, 10, "sessions", "premeet_artifacts")?;

    Ok(Session {
        id: SessionId::from_raw(row_helpers::get::<String>(row, 0, "sessions", "id")?),
        customer_id: CustomerId::from_raw(row_helpers::get::<String>(
            row,
            1,
            "sessions",
            "customer_id",
        )?),
        customer_name: row_helpers::get(row, 2, "sessions", "customer_name")?,
        stakeholder_name: row_helpers::get(row, 3, "sessions", "stakeholder_name")?,
        stakeholder_role: row_helpers::get(row, 4, "sessions", "stakeholder_role")?,
        status: row_helpers::parse_enum(&status_str, "sessions", "status")?,
        current_section: row_helpers::parse_enum(&section_str, "sessions", "current_section")?,
        section_status: row_helpers::parse_json(&section_status_raw, "sessions", "section_status")?,
        contour_map: row_helpers::parse_json(&map_raw, "sessions", "contour_map")?,
        intel_brief: row_helpers::get_opt(row, 9, "sessions", "intel_brief")?,
        premeet_artifacts: row_helpers::parse_json(&premeet_raw, "sessions", "premeet_artifacts")?,
        created_at: row_helpers::get(row, 11, "sessions", "created_at")?,
        updated_at: row_helpers::get(row, 12, "sessions", "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_core::session::{SectionId, SectionStatus, SessionStatus};

    fn input() -> CreateSessionInput {
        CreateSessionInput {
            customer_id: CustomerId::from_raw("cust_acme"),
            customer_name: "Acme Corp".into(),
            stakeholder_name: "Dana Smith".into(),
            stakeholder_role: "VP Finance".into(),
        }
    }

    #[test]
    fn create_starts_with_initial_state() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let session = repo.create(input()).unwrap();

        assert!(session.id.as_str().starts_with("sess_"));
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.current_section, SectionId::BusinessOverview);
        assert_eq!(session.contour_map.metadata.completeness_score, 0);
        assert!(session.intel_brief.is_none());
    }

    #[test]
    fn get_roundtrips_all_fields() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let created = repo.create(input()).unwrap();
        let fetched = repo.get(&created.id).unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.customer_name, "Acme Corp");
        assert_eq!(fetched.stakeholder_role, "VP Finance");
        assert_eq!(
            fetched.section_status.get(&SectionId::BusinessOverview),
            Some(&SectionStatus::InProgress)
        );
        assert_eq!(fetched.contour_map.metadata.version, "0.1");
    }

    #[test]
    fn get_nonexistent_fails() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let result = repo.get(&SessionId::from_raw("sess_missing"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_newest_first() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let first = repo.create(input()).unwrap();
        let second = repo.create(input()).unwrap();

        let all = repo.list().unwrap();
        assert_eq!(all.len(), 2);
        // Same-timestamp ties break on the monotonic id.
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn update_persists_turn_state() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let mut session = repo.create(input()).unwrap();

        session.status = SessionStatus::Paused;
        session.current_section = SectionId::SystemAuthority;
        session
            .section_status
            .insert(SectionId::BusinessOverview, SectionStatus::Complete);
        session.contour_map.metadata.completeness_score = 42;
        session.intel_brief = Some("They just acquired a competitor.".into());
        session.premeet_artifacts.push("org_chart.xlsx".into());
        repo.update(&session).unwrap();

        let fetched = repo.get(&session.id).unwrap();
        assert_eq!(fetched.status, SessionStatus::Paused);
        assert_eq!(fetched.current_section, SectionId::SystemAuthority);
        assert_eq!(
            fetched.section_status.get(&SectionId::BusinessOverview),
            Some(&SectionStatus::Complete)
        );
        assert_eq!(fetched.contour_map.metadata.completeness_score, 42);
        assert_eq!(fetched.intel_brief.as_deref(), Some("They just acquired a competitor."));
        assert_eq!(fetched.premeet_artifacts, vec!["org_chart.xlsx".to_string()]);
    }

    #[test]
    fn update_unknown_session_fails() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let mut session = repo.create(input()).unwrap();
        session.id = SessionId::from_raw("sess_missing");
        assert!(matches!(repo.update(&session), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn update_contour_map_only() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let session = repo.create(input()).unwrap();

        let mut map = session.contour_map.clone();
        map.metadata.version = "1.0-approved".into();
        repo.update_contour_map(&session.id, &map).unwrap();

        let fetched = repo.get(&session.id).unwrap();
        assert_eq!(fetched.contour_map.metadata.version, "1.0-approved");
        // Other fields untouched
        assert_eq!(fetched.status, SessionStatus::InProgress);
    }

    #[test]
    fn set_intel_brief() {
        let repo = SessionRepo::new(Database::in_memory().unwrap());
        let session = repo.create(input()).unwrap();
        repo.set_intel_brief(&session.id, "Public filings show three segments.").unwrap();

        let fetched = repo.get(&session.id).unwrap();
        assert_eq!(
            fetched.intel_brief.as_deref(),
            Some("Public filings show three segments.")
        );
    }

    #[test]
    fn corrupt_status_reported() {
        let db = Database::in_memory().unwrap();
        let repo = SessionRepo::new(db.clone());
        let session = repo.create(input()).unwrap();

        db.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET status = 'NOT_A_STATUS' WHERE id = ?1",
                [session.id.as_str()],
            )?;
            Ok(())
        })
        .unwrap();

        let result = repo.get(&session.id);
        assert!(matches!(result, Err(StoreError::CorruptRow { .. })));
    }
}
