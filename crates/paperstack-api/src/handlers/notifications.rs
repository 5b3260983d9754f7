//! Notification feed handlers.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::clamp_page;
use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, _) = clamp_page(query.limit, None);
    let notifications = state
        .db
        .notifications
        .list(auth.session.account_id, query.unread, limit)
        .await?;
    let unread_count = state
        .db
        .notifications
        .unread_count(auth.session.account_id)
        .await?;
    Ok(Json(json!({
        "notifications": notifications,
        "unread_count": unread_count,
    })))
}

/// POST /api/v1/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .notifications
        .mark_read(id, auth.session.account_id)
        .await?;
    Ok(Json(json!({ "status": "read" })))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .db
        .notifications
        .mark_all_read(auth.session.account_id)
        .await?;
    Ok(Json(json!({ "marked_read": updated })))
}
