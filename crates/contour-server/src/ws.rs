//! Realtime transport: one WebSocket per session, carrying the
//! stakeholder_message / typing / agent_message / error protocol.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use contour_core::ids::SessionId;
use contour_core::session::{SectionId, SessionStatus};
use contour_core::tools::RichContent;
use contour_engine::IncomingFile;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsIncoming {
    StakeholderMessage {
        content: String,
        #[serde(default)]
        files: Vec<WsFile>,
    },
}

#[derive(Debug, Deserialize)]
struct WsFile {
    filename: String,
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsOutgoing {
    Typing {
        status: bool,
    },
    AgentMessage {
        content: String,
        rich_content: Vec<RichContent>,
        section: SectionId,
        session_status: SessionStatus,
        contour_completeness: u32,
    },
    Error {
        error: String,
    },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let session_id = SessionId::from_raw(query.session_id);
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

async fn handle_socket(mut socket: WebSocket, session_id: SessionId, state: AppState) {
    info!(session_id = %session_id, "websocket connected");

    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            WsMessage::Text(text) => text.to_string(),
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let incoming: WsIncoming = match serde_json::from_str(&text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "unparsable websocket message");
                if !send(&mut socket, &WsOutgoing::Error { error: "Unrecognized message".into() })
                    .await
                {
                    break;
                }
                continue;
            }
        };

        let WsIncoming::StakeholderMessage { content, files } = incoming;

        if !send(&mut socket, &WsOutgoing::Typing { status: true }).await {
            break;
        }

        let incoming_files = decode_files(files);
        let reply = match state.engine.handle_turn(&session_id, &content, &incoming_files).await {
            Ok(outcome) => WsOutgoing::AgentMessage {
                content: outcome.agent_message,
                rich_content: outcome.rich_content,
                section: outcome.section,
                session_status: outcome.session_status,
                contour_completeness: outcome.completeness,
            },
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "turn failed");
                WsOutgoing::Error { error: "Failed to process message".into() }
            }
        };

        if !send(&mut socket, &reply).await {
            break;
        }
        if !send(&mut socket, &WsOutgoing::Typing { status: false }).await {
            break;
        }
    }

    info!(session_id = %session_id, "websocket disconnected");
}

/// Decode base64 payloads into the ingestion-collaborator record. Content
/// extraction happens outside this core; the turn records metadata and the
/// payload size so the model knows the file arrived.
fn decode_files(files: Vec<WsFile>) -> Vec<IncomingFile> {
    files
        .into_iter()
        .filter_map(|f| {
            match base64::engine::general_purpose::STANDARD.decode(&f.data) {
                Ok(bytes) => Some(IncomingFile {
                    filename: f.filename,
                    mime_type: f.mime_type,
                    extracted_data: serde_json::json!({"size_bytes": bytes.len()}),
                }),
                Err(e) => {
                    warn!(filename = %f.filename, error = %e, "dropping undecodable file payload");
                    None
                }
            }
        })
        .collect()
}

async fn send(socket: &mut WebSocket, outgoing: &WsOutgoing) -> bool {
    let json = match serde_json::to_string(outgoing) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize websocket frame");
            return false;
        }
    };
    socket.send(WsMessage::Text(json.into())).await.is_ok()
}
