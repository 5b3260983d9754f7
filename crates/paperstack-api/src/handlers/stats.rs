//! Library statistics handler.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{ApiError, AppState, RequireAuth};

/// GET /api/v1/stats
///
/// Library totals plus the caller's recent activity.
pub async fn library_stats(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .db
        .activity
        .library_stats(auth.session.account_id)
        .await?;
    let recent = state
        .db
        .activity
        .recent(auth.session.account_id, 10)
        .await?;

    Ok(Json(json!({
        "stats": stats,
        "recent_activity": recent,
    })))
}
