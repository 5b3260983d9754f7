//! Chat session handlers.
//!
//! Sessions persist both sides of the conversation; each new message
//! replays the stored history to the generation backend, with the
//! scoped document's text folded into the system prompt.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::{ChatRole, ChatSession, DocumentRepository, ShareRole};
use paperstack_inference::{build_chat_system, ChatTurn, GenerationBackend};

use super::require_document_role;
use crate::{ApiError, AppState, RequireAuth};

const DEFAULT_SESSION_TITLE: &str = "New Chat";

async fn owned_session(
    state: &AppState,
    account_id: Uuid,
    session_id: Uuid,
) -> Result<ChatSession, ApiError> {
    let session = state.db.chat.fetch_session(session_id).await?;
    if session.account_id != account_id {
        return Err(ApiError::NotFound(format!(
            "Chat session {} not found",
            session_id
        )));
    }
    Ok(session)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub document_id: Option<Uuid>,
    pub title: Option<String>,
}

/// POST /api/v1/chat/sessions
pub async fn create_session(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(document_id) = req.document_id {
        let document = state.db.documents.fetch(document_id).await?;
        require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer)
            .await?;
    }

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SESSION_TITLE);

    let session = state
        .db
        .chat
        .create_session(auth.session.account_id, req.document_id, title)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/chat/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state
        .db
        .chat
        .list_sessions(auth.session.account_id)
        .await?;
    Ok(Json(sessions))
}

/// DELETE /api/v1/chat/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    owned_session(&state, auth.session.account_id, id).await?;
    state.db.chat.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/chat/sessions/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    owned_session(&state, auth.session.account_id, id).await?;
    let messages = state.db.chat.messages(id).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

/// POST /api/v1/chat/sessions/:id/messages
///
/// Persists the user message, generates the reply from the full stored
/// history, persists it, and returns both.
pub async fn post_message(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }

    let session = owned_session(&state, auth.session.account_id, id).await?;
    let backend = super::ai::backend(&state)?;

    let document_text = match session.document_id {
        Some(document_id) => state
            .db
            .documents
            .fetch(document_id)
            .await?
            .extracted_text,
        None => None,
    };
    let system = build_chat_system(document_text.as_deref());

    let user_message = state
        .db
        .chat
        .add_message(id, ChatRole::User, content)
        .await?;

    let history: Vec<ChatTurn> = state
        .db
        .chat
        .messages(id)
        .await?
        .into_iter()
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content,
        })
        .collect();

    let reply = backend.chat(&system, &history).await?;
    let assistant_message = state
        .db
        .chat
        .add_message(id, ChatRole::Assistant, reply.trim())
        .await?;

    Ok(Json(json!({
        "user_message": user_message,
        "assistant_message": assistant_message,
    })))
}
