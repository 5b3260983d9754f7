//! Study group handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use paperstack_core::NotificationKind;

use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .db
        .groups
        .insert(
            auth.session.account_id,
            &req.name,
            req.description.as_deref(),
        )
        .await?;
    let group = state.db.groups.fetch(id).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .db
        .groups
        .list_for_account(auth.session.account_id)
        .await?;
    Ok(Json(groups))
}

/// GET /api/v1/groups/:id
///
/// Group details with the member roster; members only.
pub async fn get_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.db.groups.fetch(id).await?;
    if !state
        .db
        .groups
        .is_member(id, auth.session.account_id)
        .await?
    {
        return Err(ApiError::NotFound(format!("Group {} not found", id)));
    }
    let members = state.db.groups.members(id).await?;
    Ok(Json(json!({
        "group": group,
        "members": members,
    })))
}

/// DELETE /api/v1/groups/:id
pub async fn delete_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.db.groups.fetch(id).await?;
    if group.owner_id != auth.session.account_id {
        return Err(ApiError::Forbidden(
            "Only the group owner can delete a group".to_string(),
        ));
    }
    state.db.groups.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
}

/// POST /api/v1/groups/:id/members
pub async fn add_member(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.db.groups.fetch(id).await?;
    if group.owner_id != auth.session.account_id {
        return Err(ApiError::Forbidden(
            "Only the group owner can add members".to_string(),
        ));
    }

    let account = state
        .db
        .accounts
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No account with email {}", req.email)))?;

    state.db.groups.add_member(id, account.id).await?;
    state
        .db
        .notifications
        .insert(
            account.id,
            NotificationKind::GroupAdded,
            &format!("You were added to the study group \"{}\"", group.name),
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "added" }))))
}

/// DELETE /api/v1/groups/:id/members/:account_id
///
/// The owner removes anyone; members may remove themselves.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, account_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.db.groups.fetch(id).await?;
    let caller = auth.session.account_id;

    if caller != group.owner_id && caller != account_id {
        return Err(ApiError::Forbidden(
            "Only the group owner can remove other members".to_string(),
        ));
    }
    if account_id == group.owner_id {
        return Err(ApiError::BadRequest(
            "The group owner cannot be removed".to_string(),
        ));
    }

    state.db.groups.remove_member(id, account_id).await?;

    if caller != account_id {
        state
            .db
            .notifications
            .insert(
                account_id,
                NotificationKind::GroupRemoved,
                &format!("You were removed from the study group \"{}\"", group.name),
                None,
            )
            .await?;
    }

    Ok(StatusCode::NO_CONTENT)
}
