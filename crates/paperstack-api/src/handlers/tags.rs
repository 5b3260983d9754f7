//! Tag cloud and tag-scoped document listings.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use paperstack_core::TagRepository;

use super::clamp_page;
use crate::{ApiError, AppState, RequireAuth};

/// GET /api/v1/tags
///
/// The caller's tags with per-tag document counts, busiest first.
pub async fn list_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state
        .db
        .tags
        .list_with_counts(auth.session.account_id)
        .await?;
    Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct TagDocumentsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/tags/:slug/documents
pub async fn documents_for_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(slug): Path<String>,
    Query(query): Query<TagDocumentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = clamp_page(query.limit, query.offset);
    let page = state
        .db
        .documents
        .list_by_tag(auth.session.account_id, &slug, limit, offset)
        .await?;
    Ok(Json(page))
}
