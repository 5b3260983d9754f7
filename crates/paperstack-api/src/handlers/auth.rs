//! Session login, logout, and current-account handlers.
//!
//! The IdP redirect flow lives outside this service: the frontend (or a
//! gateway) verifies the provider token and hands us the verified
//! profile. We upsert the account and mint an opaque session token.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use paperstack_core::IdentityProfile;

use crate::{ApiError, AppState, RequireAuth};

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// POST /api/v1/auth/login
///
/// Accepts a verified identity profile, upserts the account, and
/// returns a fresh session token.
pub async fn login(
    State(state): State<AppState>,
    Json(profile): Json<IdentityProfile>,
) -> Result<impl IntoResponse, ApiError> {
    if profile.subject.trim().is_empty() || profile.email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "subject and email are required".to_string(),
        ));
    }

    let account = state.db.accounts.upsert_from_profile(&profile).await?;
    let token = state.db.sessions.create(account.id).await?;

    info!(
        subsystem = "api",
        op = "login",
        account_id = %account.id,
        "Session issued"
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "token": token,
            "account": account,
        })),
    ))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    state.db.sessions.revoke(token).await?;
    Ok(Json(json!({ "status": "logged_out" })))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.db.accounts.fetch(auth.session.account_id).await?;
    Ok(Json(account))
}
