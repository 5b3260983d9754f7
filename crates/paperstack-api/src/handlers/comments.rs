//! Document comment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::{ActivityKind, DocumentRepository, NotificationKind, ShareRole};

use super::require_document_role;
use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// POST /api/v1/documents/:id/comments
///
/// Anyone with viewer access may comment; the document owner is
/// notified about comments from other accounts.
pub async fn create_comment(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("body is required".to_string()));
    }

    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;

    let comment = state
        .db
        .comments
        .insert(id, auth.session.account_id, req.body.trim())
        .await?;

    if document.owner_id != auth.session.account_id {
        let author = state.db.accounts.fetch(auth.session.account_id).await?;
        state
            .db
            .notifications
            .insert(
                document.owner_id,
                NotificationKind::CommentAdded,
                &format!(
                    "{} commented on \"{}\"",
                    author.name.as_deref().unwrap_or(&author.email),
                    document.original_filename
                ),
                Some(id),
            )
            .await?;
    }

    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Comment,
            Some(id),
            json!({}),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/v1/documents/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;
    let comments = state.db.comments.list_for_document(id).await?;
    Ok(Json(comments))
}

/// DELETE /api/v1/comments/:id
///
/// The author or the document owner may remove a comment.
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.db.comments.fetch(id).await?;
    let caller = auth.session.account_id;

    if comment.author_id != caller {
        let document = state.db.documents.fetch(comment.document_id).await?;
        if document.owner_id != caller {
            return Err(ApiError::Forbidden(
                "Only the author or document owner can delete a comment".to_string(),
            ));
        }
    }

    state.db.comments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
