//! Document and collection sharing handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::{
    ActivityKind, CollectionRepository, DocumentRepository, NotificationKind, ShareRole,
};

use super::{require_collection_role, require_document_role};
use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub email: String,
    pub role: ShareRole,
}

/// POST /api/v1/documents/:id/shares
pub async fn share_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Admin).await?;

    let grantee = state
        .db
        .accounts
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No account with email {}", req.email)))?;

    if grantee.id == document.owner_id {
        return Err(ApiError::BadRequest(
            "Cannot share a document with its owner".to_string(),
        ));
    }

    let share_id = state
        .db
        .shares
        .grant_document(id, grantee.id, req.role, auth.session.account_id)
        .await?;

    let granter = state.db.accounts.fetch(auth.session.account_id).await?;
    state
        .db
        .notifications
        .insert(
            grantee.id,
            NotificationKind::DocumentShared,
            &format!(
                "{} shared \"{}\" with you",
                granter.name.as_deref().unwrap_or(&granter.email),
                document.original_filename
            ),
            Some(id),
        )
        .await?;
    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Share,
            Some(id),
            json!({ "grantee": grantee.email, "role": req.role }),
        )
        .await?;

    let share = state.db.shares.fetch(share_id).await?;
    Ok((StatusCode::CREATED, Json(share)))
}

/// GET /api/v1/documents/:id/shares
pub async fn list_document_shares(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Admin).await?;
    let shares = state.db.shares.list_for_document(id).await?;
    Ok(Json(shares))
}

/// POST /api/v1/collections/:id/shares
pub async fn share_collection(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Admin)
        .await?;

    let grantee = state
        .db
        .accounts
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No account with email {}", req.email)))?;

    if grantee.id == collection.owner_id {
        return Err(ApiError::BadRequest(
            "Cannot share a collection with its owner".to_string(),
        ));
    }

    let share_id = state
        .db
        .shares
        .grant_collection(id, grantee.id, req.role, auth.session.account_id)
        .await?;

    let granter = state.db.accounts.fetch(auth.session.account_id).await?;
    state
        .db
        .notifications
        .insert(
            grantee.id,
            NotificationKind::CollectionShared,
            &format!(
                "{} shared the collection \"{}\" with you",
                granter.name.as_deref().unwrap_or(&granter.email),
                collection.name
            ),
            None,
        )
        .await?;

    let share = state.db.shares.fetch(share_id).await?;
    Ok((StatusCode::CREATED, Json(share)))
}

/// GET /api/v1/collections/:id/shares
pub async fn list_collection_shares(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Admin)
        .await?;
    let shares = state.db.shares.list_for_collection(id).await?;
    Ok(Json(shares))
}

/// DELETE /api/v1/shares/:id
///
/// Revocable by whoever granted the share, the subject's owner, or the
/// grantee walking away.
pub async fn revoke_share(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let share = state.db.shares.fetch(id).await?;
    let caller = auth.session.account_id;

    let mut permitted = share.granted_by == caller || share.grantee_id == caller;
    if !permitted {
        if let Some(doc_id) = share.document_id {
            let document = state.db.documents.fetch(doc_id).await?;
            permitted = document.owner_id == caller;
        } else if let Some(coll_id) = share.collection_id {
            let collection = state.db.collections.fetch(coll_id).await?;
            permitted = collection.owner_id == caller;
        }
    }
    if !permitted {
        return Err(ApiError::Forbidden(
            "Only the grantor, owner, or grantee can revoke a share".to_string(),
        ));
    }

    state.db.shares.revoke(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/shared-with-me
pub async fn shared_with_me(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let shares = state
        .db
        .shares
        .list_for_grantee(auth.session.account_id)
        .await?;
    Ok(Json(shares))
}
