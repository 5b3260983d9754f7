//! Text search, TF-IDF semantic search, and related-document handlers.
//!
//! The similarity index is rebuilt per request from the caller's
//! extracted-text corpus. Libraries here are hundreds of documents, not
//! millions; a rebuild is milliseconds and dodges invalidation.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::{defaults, ActivityKind, DocumentRepository, ShareRole};
use paperstack_search::SimilarityIndex;

use super::{clamp_page, require_document_role};
use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/search
///
/// ILIKE match over filename, subject, and extracted text.
pub async fn search_documents(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest("q is required".to_string()));
    }

    let (limit, offset) = clamp_page(query.limit, query.offset);
    let page = state
        .db
        .documents
        .text_search(auth.session.account_id, q, limit, offset)
        .await?;

    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Search,
            None,
            json!({ "query": q, "results": page.pagination.total }),
        )
        .await?;

    Ok(Json(page))
}

/// GET /api/v1/search/semantic
///
/// Ranks the caller's corpus against the query as a pseudo-document.
pub async fn semantic_search(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest("q is required".to_string()));
    }

    let (limit, _) = clamp_page(query.limit, None);
    let corpus = state.db.documents.corpus(auth.session.account_id).await?;
    let index = SimilarityIndex::build(&corpus);
    let hits = index.search(q, limit as usize);

    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Search,
            None,
            json!({ "query": q, "semantic": true, "results": hits.len() }),
        )
        .await?;

    Ok(Json(ranked_results(&state, &hits).await?))
}

/// GET /api/v1/documents/:id/related
///
/// Cosine neighbors of the document's extracted text within the owner's
/// corpus. Empty when the document has no text.
pub async fn related_documents(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;

    let corpus = state.db.documents.corpus(document.owner_id).await?;
    let index = SimilarityIndex::build(&corpus);
    let hits = index.related(id, defaults::RELATED_LIMIT);

    Ok(Json(ranked_results(&state, &hits).await?))
}

/// Fetch summaries for hits and emit them in score order with scores
/// attached.
async fn ranked_results(
    state: &AppState,
    hits: &[paperstack_search::SimilarityHit],
) -> Result<serde_json::Value, ApiError> {
    let ids: Vec<Uuid> = hits.iter().map(|h| h.document_id).collect();
    let summaries = state.db.documents.summaries_by_ids(&ids).await?;
    let by_id: HashMap<Uuid, _> = summaries.into_iter().map(|s| (s.id, s)).collect();

    let results: Vec<serde_json::Value> = hits
        .iter()
        .filter_map(|hit| {
            by_id.get(&hit.document_id).map(|summary| {
                json!({
                    "document": summary,
                    "score": hit.score,
                })
            })
        })
        .collect();

    Ok(json!({ "results": results }))
}
