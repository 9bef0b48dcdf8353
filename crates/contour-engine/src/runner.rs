//! Conversation orchestrator: the tool-call round loop that mediates
//! between the gateway and the session's contour map and section state.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use contour_core::context::PromptContext;
use contour_core::contour::{ContourMap, UploadedArtifact};
use contour_core::gateway::{ChatGateway, RequestOptions};
use contour_core::ids::SessionId;
use contour_core::messages::{Message, ToolCallBlock};
use contour_core::session::{ConversationState, SectionId, Session, SessionStatus};
use contour_core::tools::RichContent;
use contour_llm::catalog::interview_tools;
use contour_store::messages::{MessageRepo, MessageRole, MessageRow};
use contour_store::sessions::SessionRepo;
use contour_store::{Database, StoreError};

use crate::context::ContextBuilder;
use crate::contour;
use crate::dispatch::ToolDispatcher;
use crate::error::EngineError;
use crate::lookup::SystemLookup;
use crate::state;

/// Bound on tool-call rounds per turn, so a misbehaving model cannot keep
/// the loop alive forever.
pub const MAX_TOOL_ROUNDS: u32 = 10;

const PLACEHOLDER_TEXT: &str = "(No response text)";

pub struct EngineConfig {
    pub max_tool_rounds: u32,
    pub request: RequestOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: MAX_TOOL_ROUNDS,
            request: RequestOptions::default(),
        }
    }
}

/// A file already run through the ingestion collaborator: metadata plus
/// whatever it extracted.
#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub filename: String,
    pub mime_type: String,
    pub extracted_data: serde_json::Value,
}

/// What a processed turn hands back to the transport.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub agent_message: String,
    pub rich_content: Vec<RichContent>,
    pub section: SectionId,
    pub session_status: SessionStatus,
    pub completeness: u32,
}

pub struct ConversationEngine {
    gateway: Arc<dyn ChatGateway>,
    dispatcher: ToolDispatcher,
    context: ContextBuilder,
    sessions: SessionRepo,
    messages: MessageRepo,
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
    config: EngineConfig,
}

impl ConversationEngine {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        db: Database,
        lookup: Option<Arc<SystemLookup>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            dispatcher: ToolDispatcher::new(lookup.clone()),
            context: ContextBuilder::new(lookup),
            sessions: SessionRepo::new(db.clone()),
            messages: MessageRepo::new(db),
            turn_locks: DashMap::new(),
            config,
        }
    }

    /// Process one stakeholder turn. Turns within a session are serialized:
    /// the per-session lock is held from state load through persistence, so
    /// concurrent turns never interleave their read-modify-write. A failed
    /// gateway call aborts the turn before anything is persisted.
    #[instrument(skip(self, text, files), fields(session_id = %session_id))]
    pub async fn handle_turn(
        &self,
        session_id: &SessionId,
        text: &str,
        files: &[IncomingFile],
    ) -> Result<TurnOutcome, EngineError> {
        let lock = self.turn_lock(session_id);
        let _guard = lock.lock().await;

        let session = self.sessions.get(session_id).map_err(|e| match e {
            StoreError::NotFound(_) => EngineError::SessionNotFound(session_id.to_string()),
            other => EngineError::Store(other),
        })?;
        if session.status == SessionStatus::Complete {
            return Err(EngineError::SessionComplete);
        }

        let now = Utc::now().to_rfc3339();
        let entry_section = session.current_section;
        let mut map = session.contour_map.clone();
        let mut state = session.conversation_state();

        let artifacts = build_artifacts(files, entry_section, &now);
        for artifact in &artifacts {
            map = contour::add_artifact(&map, artifact.clone(), &now);
        }

        let mut history: Vec<Message> = self
            .messages
            .list(session_id)?
            .iter()
            .filter_map(row_to_message)
            .collect();
        // The model sees extraction summaries appended; the persisted record
        // keeps the stakeholder's literal text.
        history.push(Message::user_text(model_visible_text(text, &artifacts)));

        let mut rich_content: Vec<RichContent> = Vec::new();
        let mut last_text = String::new();
        let mut rounds = 0u32;

        let mut reply = self
            .gateway
            .complete(
                &self.prompt_context(&session, &state, &map, history.clone()).await,
                &self.config.request,
            )
            .await?;

        while reply.has_tool_calls() && rounds < self.config.max_tool_rounds {
            rounds += 1;
            let calls: Vec<ToolCallBlock> = reply.tool_calls().into_iter().cloned().collect();
            let text_part = reply.text_content();
            if !text_part.is_empty() {
                last_text = text_part;
            }
            history.push(Message::Assistant(reply.clone()));

            for call in &calls {
                let result = self
                    .dispatcher
                    .dispatch(call, &map, &session.customer_id, &now)
                    .await;
                map = result.map;
                if let Some(display) = result.display {
                    rich_content.push(display);
                }
                // State actions apply immediately: later calls in the same
                // round already see the post-transition section.
                if let Some(action) = result.state_action {
                    state = state::reduce(&state, &action);
                }
                history.push(Message::tool_result(call.id.clone(), result.reply));
            }

            reply = self
                .gateway
                .complete(
                    &self.prompt_context(&session, &state, &map, history.clone()).await,
                    &self.config.request,
                )
                .await?;
        }

        let agent_text = final_text(&reply.text_content(), &last_text, reply.has_tool_calls());
        if reply.has_tool_calls() {
            info!(rounds, "tool round limit reached, degrading to best available text");
        }

        drop(self.messages.append(
            session_id,
            MessageRole::Stakeholder,
            text,
            &[],
            entry_section.as_str(),
        )?);
        drop(self.messages.append(
            session_id,
            MessageRole::Agent,
            &agent_text,
            &rich_content,
            state.current_section.as_str(),
        )?);

        let mut updated = session;
        updated.contour_map = map;
        updated.status = state.status;
        updated.current_section = state.current_section;
        updated.section_status = state.section_status;
        self.sessions.update(&updated)?;

        Ok(TurnOutcome {
            agent_message: agent_text,
            rich_content,
            section: updated.current_section,
            session_status: updated.status,
            completeness: updated.contour_map.metadata.completeness_score,
        })
    }

    async fn prompt_context(
        &self,
        session: &Session,
        state: &ConversationState,
        map: &ContourMap,
        messages: Vec<Message>,
    ) -> PromptContext {
        PromptContext {
            system_blocks: self.context.build(session, state.current_section, map).await,
            messages,
            tools: interview_tools(),
        }
    }

    fn turn_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        self.turn_locks
            .entry(session_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

fn build_artifacts(files: &[IncomingFile], section: SectionId, now: &str) -> Vec<UploadedArtifact> {
    files
        .iter()
        .map(|f| UploadedArtifact {
            id: format!("file_{}", Uuid::now_v7()),
            filename: f.filename.clone(),
            mime_type: f.mime_type.clone(),
            extracted_data: f.extracted_data.clone(),
            section: section.as_str().to_string(),
            uploaded_at: now.to_string(),
        })
        .collect()
}

fn model_visible_text(text: &str, artifacts: &[UploadedArtifact]) -> String {
    let mut out = text.to_string();
    for artifact in artifacts {
        out.push_str(&format!(
            "\n\n[Uploaded file {} ({}), id {}. Extracted data: {}]",
            artifact.filename, artifact.mime_type, artifact.id, artifact.extracted_data
        ));
    }
    out
}

fn final_text(reply_text: &str, last_text: &str, limit_hit: bool) -> String {
    if !reply_text.is_empty() {
        return reply_text.to_string();
    }
    if limit_hit && !last_text.is_empty() {
        return last_text.to_string();
    }
    PLACEHOLDER_TEXT.to_string()
}

fn row_to_message(row: &MessageRow) -> Option<Message> {
    match row.role {
        MessageRole::Stakeholder => Some(Message::user_text(&row.content)),
        MessageRole::Agent => Some(Message::assistant_text(&row.content)),
        MessageRole::System => None,
    }
}
