//! Collection CRUD and membership handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::{CollectionInput, CollectionRepository, DocumentRepository, ShareRole};

use super::{require_collection_role, require_document_role};
use crate::{ApiError, AppState, RequireAuth};

/// GET /api/v1/collections
pub async fn list_collections(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let collections = state
        .db
        .collections
        .list(auth.session.account_id)
        .await?;
    Ok(Json(collections))
}

/// POST /api/v1/collections
pub async fn create_collection(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(input): Json<CollectionInput>,
) -> Result<impl IntoResponse, ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    let id = state
        .db
        .collections
        .insert(auth.session.account_id, input)
        .await?;
    let collection = state.db.collections.fetch(id).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// GET /api/v1/collections/:id
///
/// Returns the collection together with its documents.
pub async fn get_collection(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Viewer)
        .await?;
    let documents = state.db.collections.documents(id).await?;
    Ok(Json(json!({
        "collection": collection,
        "documents": documents,
    })))
}

/// PATCH /api/v1/collections/:id
pub async fn update_collection(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(input): Json<CollectionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Editor)
        .await?;

    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    state.db.collections.update(id, input).await?;
    let updated = state.db.collections.fetch(id).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/collections/:id
///
/// Deletes the grouping only; member documents are untouched.
pub async fn delete_collection(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Admin)
        .await?;
    state.db.collections.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentsRequest {
    pub document_ids: Vec<Uuid>,
}

/// POST /api/v1/collections/:id/documents
///
/// Bulk add. Documents the caller cannot edit are skipped; the response
/// reports how many actually landed.
pub async fn add_documents(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<AddDocumentsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Editor)
        .await?;

    if req.document_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "document_ids must not be empty".to_string(),
        ));
    }

    let mut allowed = Vec::with_capacity(req.document_ids.len());
    for doc_id in &req.document_ids {
        // Unknown ids and inaccessible documents are skipped, not fatal;
        // the caller learns the real count from the response.
        let document = match state.db.documents.fetch(*doc_id).await {
            Ok(document) => document,
            Err(paperstack_core::Error::DocumentNotFound(_)) => continue,
            Err(e) => return Err(e.into()),
        };
        if require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer)
            .await
            .is_ok()
        {
            allowed.push(*doc_id);
        }
    }

    let added = state.db.collections.add_documents(id, &allowed).await?;
    Ok(Json(json!({
        "added": added,
        "requested": req.document_ids.len(),
    })))
}

/// DELETE /api/v1/collections/:id/documents/:doc_id
pub async fn remove_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, doc_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = state.db.collections.fetch(id).await?;
    require_collection_role(&state, auth.session.account_id, &collection, ShareRole::Editor)
        .await?;
    state.db.collections.remove_document(id, doc_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
