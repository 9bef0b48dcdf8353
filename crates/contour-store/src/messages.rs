use chrono::Utc;
use tracing::instrument;

use contour_core::ids::{MessageId, SessionId};
use contour_core::tools::RichContent;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Who produced a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageRole {
    Agent,
    Stakeholder,
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Agent => "AGENT",
            Self::Stakeholder => "STAKEHOLDER",
            Self::System => "SYSTEM",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGENT" => Ok(Self::Agent),
            "STAKEHOLDER" => Ok(Self::Stakeholder),
            "SYSTEM" => Ok(Self::System),
            other => Err(format!("unknown message role: {other}")),
        }
    }
}

/// One persisted transcript entry.
#[derive(Clone, Debug)]
pub struct MessageRow {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    pub rich_content: Option<Vec<RichContent>>,
    pub section: String,
    pub created_at: String,
}

pub struct MessageRepo {
    db: Database,
}

impl MessageRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append a transcript entry.
    #[instrument(skip(self, content, rich_content), fields(session_id = %session_id, role = %role))]
    pub fn append(
        &self,
        session_id: &SessionId,
        role: MessageRole,
        content: &str,
        rich_content: &[RichContent],
        section: &str,
    ) -> Result<MessageRow, StoreError> {
        let id = MessageId::new();
        let now = Utc::now().to_rfc3339();
        let rich_json = if rich_content.is_empty() {
            None
        } else {
            Some(serde_json::to_string(rich_content)?)
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, role, content, rich_content, section, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.as_str(),
                    session_id.as_str(),
                    role.to_string(),
                    content,
                    rich_json,
                    section,
                    now,
                ],
            )?;
            Ok(())
        })?;

        Ok(MessageRow {
            id,
            session_id: session_id.clone(),
            role,
            content: content.to_string(),
            rich_content: if rich_content.is_empty() {
                None
            } else {
                Some(rich_content.to_vec())
            },
            section: section.to_string(),
            created_at: now,
        })
    }

    /// List a session's transcript in conversation order.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn list(&self, session_id: &SessionId) -> Result<Vec<MessageRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, rich_content, section, created_at
                 FROM messages WHERE session_id = ?1 ORDER BY id ASC",
            )?;
            let mut rows = stmt.query([session_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_message(row)?);
            }
            Ok(results)
        })
    }

    /// Number of entries in a session's transcript.
    pub fn count(&self, session_id: &SessionId) -> Result<u64, StoreError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
                [session_id.as_str()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<MessageRow, StoreError> {
    let role_str: String = row_helpers::get(row, 2, "messages", "role")?;
    let rich_raw: Option<String> = row_helpers::get_opt(row, 4, "messages", "rich_content")?;
    let rich_content = match rich_raw {
        Some(raw) => Some(row_helpers::parse_json(&raw, "messages", "rich_content")?),
        None => None,
    };

    Ok(MessageRow {
        id: MessageId::from_raw(row_helpers::get::<String>(row, 0, "messages", "id")?),
        session_id: SessionId::from_raw(row_helpers::get::<String>(row, 1, "messages", "session_id")?),
        role: row_helpers::parse_enum(&role_str, "messages", "role")?,
        content: row_helpers::get(row, 3, "messages", "content")?,
        rich_content,
        section: row_helpers::get(row, 5, "messages", "section")?,
        created_at: row_helpers::get(row, 6, "messages", "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::{CreateSessionInput, SessionRepo};
    use contour_core::ids::CustomerId;

    fn setup() -> (Database, SessionId) {
        let db = Database::in_memory().unwrap();
        let sessions = SessionRepo::new(db.clone());
        let session = sessions
            .create(CreateSessionInput {
                customer_id: CustomerId::new(),
                customer_name: "Acme".into(),
                stakeholder_name: "Dana".into(),
                stakeholder_role: "CFO".into(),
            })
            .unwrap();
        (db, session.id)
    }

    #[test]
    fn append_and_list_in_order() {
        let (db, session_id) = setup();
        let repo = MessageRepo::new(db);

        repo.append(&session_id, MessageRole::Stakeholder, "We have three divisions", &[], "1")
            .unwrap();
        repo.append(&session_id, MessageRole::Agent, "Got it — how do they roll up?", &[], "1")
            .unwrap();

        let rows = repo.list(&session_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, MessageRole::Stakeholder);
        assert_eq!(rows[0].content, "We have three divisions");
        assert_eq!(rows[1].role, MessageRole::Agent);
        assert!(rows[0].rich_content.is_none());
    }

    #[test]
    fn rich_content_roundtrip() {
        let (db, session_id) = setup();
        let repo = MessageRepo::new(db);

        let rich = vec![RichContent::Table {
            title: "SOR map".into(),
            headers: vec!["Dimension".into(), "System".into()],
            rows: vec![vec!["Cost Center".into(), "SAP".into()]],
        }];
        repo.append(&session_id, MessageRole::Agent, "Here's what I have", &rich, "2")
            .unwrap();

        let rows = repo.list(&session_id).unwrap();
        let fetched = rows[0].rich_content.as_ref().unwrap();
        assert_eq!(fetched.len(), 1);
        match &fetched[0] {
            RichContent::Table { title, rows, .. } => {
                assert_eq!(title, "SOR map");
                assert_eq!(rows[0][1], "SAP");
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn count_messages() {
        let (db, session_id) = setup();
        let repo = MessageRepo::new(db);
        assert_eq!(repo.count(&session_id).unwrap(), 0);

        repo.append(&session_id, MessageRole::Stakeholder, "hi", &[], "1").unwrap();
        assert_eq!(repo.count(&session_id).unwrap(), 1);
    }

    #[test]
    fn list_empty_session() {
        let (db, session_id) = setup();
        let repo = MessageRepo::new(db);
        assert!(repo.list(&session_id).unwrap().is_empty());
    }
}
