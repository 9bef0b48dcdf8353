//! REST endpoints: session lifecycle, the synchronous turn fallback, and
//! contour map retrieval/approval.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use contour_core::contour::APPROVED_VERSION;
use contour_core::ids::{CustomerId, SessionId};
use contour_core::session::{Session, SessionStatus};
use contour_engine::state::completion_percentage;
use contour_engine::IncomingFile;
use contour_store::messages::MessageRepo;
use contour_store::sessions::{CreateSessionInput, SessionRepo};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub stakeholder_name: String,
    #[serde(default)]
    pub stakeholder_role: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub files: Vec<FileBody>,
}

#[derive(Debug, Deserialize)]
pub struct FileBody {
    pub filename: String,
    pub mime_type: String,
    #[serde(default)]
    pub extracted_data: Value,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.customer_id.is_empty()
        || body.customer_name.is_empty()
        || body.stakeholder_name.is_empty()
        || body.stakeholder_role.is_empty()
    {
        return Err(ApiError::bad_request(
            "Missing required fields: customer_id, customer_name, stakeholder_name, stakeholder_role",
        ));
    }

    let session = SessionRepo::new(state.db.clone()).create(CreateSessionInput {
        customer_id: CustomerId::from_raw(body.customer_id),
        customer_name: body.customer_name,
        stakeholder_name: body.stakeholder_name,
        stakeholder_role: body.stakeholder_role,
    })?;

    Ok((StatusCode::CREATED, Json(session_summary(&session))))
}

pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sessions = SessionRepo::new(state.db.clone()).list()?;
    Ok(Json(Value::Array(sessions.iter().map(session_summary).collect())))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = SessionRepo::new(state.db.clone()).get(&SessionId::from_raw(id))?;
    Ok(Json(session_summary(&session)))
}

/// Synchronous fallback mirroring the WebSocket turn contract.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<Value>, ApiError> {
    if body.content.is_empty() {
        return Err(ApiError::bad_request("Missing required field: content"));
    }

    let files: Vec<IncomingFile> = body
        .files
        .into_iter()
        .map(|f| IncomingFile {
            filename: f.filename,
            mime_type: f.mime_type,
            extracted_data: f.extracted_data,
        })
        .collect();

    let outcome = state
        .engine
        .handle_turn(&SessionId::from_raw(id), &body.content, &files)
        .await?;

    Ok(Json(json!({
        "agent_message": outcome.agent_message,
        "rich_content": outcome.rich_content,
        "section": outcome.section,
        "session_status": outcome.session_status,
        "contour_completeness": outcome.completeness,
    })))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session_id = SessionId::from_raw(id);
    // 404 for unknown sessions rather than an empty transcript.
    drop(SessionRepo::new(state.db.clone()).get(&session_id)?);

    let rows = MessageRepo::new(state.db.clone()).list(&session_id)?;
    let messages: Vec<Value> = rows
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "session_id": m.session_id,
                "role": m.role.to_string(),
                "content": m.content,
                "rich_content": m.rich_content,
                "section": m.section,
                "timestamp": m.created_at,
            })
        })
        .collect();
    Ok(Json(Value::Array(messages)))
}

pub async fn get_contour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = SessionRepo::new(state.db.clone()).get(&SessionId::from_raw(id))?;
    Ok(Json(serde_json::to_value(&session.contour_map).map_err(|e| ApiError::internal(e.to_string()))?))
}

/// Tag the map as approved. Only valid once the interview is complete; the
/// approved version is what the downstream graph export consumes.
pub async fn approve_contour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = SessionRepo::new(state.db.clone());
    let session = repo.get(&SessionId::from_raw(id))?;

    if session.status != SessionStatus::Complete {
        return Err(ApiError::bad_request("Session must be complete before approval"));
    }

    let mut map = session.contour_map.clone();
    map.metadata.version = APPROVED_VERSION.to_string();
    map.metadata.last_updated = Utc::now().to_rfc3339();
    repo.update_contour_map(&session.id, &map)?;

    Ok(Json(json!({
        "status": "approved",
        "contour_map": map,
    })))
}

pub async fn get_followups(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = SessionRepo::new(state.db.clone()).get(&SessionId::from_raw(id))?;
    Ok(Json(
        serde_json::to_value(&session.contour_map.follow_up_tasks)
            .map_err(|e| ApiError::internal(e.to_string()))?,
    ))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "contour-interview-engine"}))
}

fn session_summary(session: &Session) -> Value {
    json!({
        "id": session.id,
        "customer_id": session.customer_id,
        "customer_name": session.customer_name,
        "stakeholder_name": session.stakeholder_name,
        "stakeholder_role": session.stakeholder_role,
        "status": session.status,
        "current_section": session.current_section,
        "section_status": session.section_status,
        "completion_percentage": completion_percentage(&session.conversation_state()),
        "contour_map_summary": {
            "completeness_score": session.contour_map.metadata.completeness_score,
        },
        "premeet_artifacts_received": session.premeet_artifacts,
        "created_at": session.created_at,
        "updated_at": session.updated_at,
    })
}
