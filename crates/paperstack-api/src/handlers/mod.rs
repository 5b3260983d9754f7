//! HTTP handler modules for paperstack-api.

pub mod ai;
pub mod auth;
pub mod chat;
pub mod collections;
pub mod comments;
pub mod documents;
pub mod groups;
pub mod notifications;
pub mod search;
pub mod shares;
pub mod stats;
pub mod tags;

use uuid::Uuid;

use paperstack_core::{Collection, Document, ShareRole};

use crate::{ApiError, AppState};

/// The caller's effective role on a document.
///
/// Owners hold implicit admin; everyone else needs a share grant,
/// direct or via a shared collection containing the document.
pub(crate) async fn document_role(
    state: &AppState,
    account_id: Uuid,
    document: &Document,
) -> Result<Option<ShareRole>, ApiError> {
    if document.owner_id == account_id {
        return Ok(Some(ShareRole::Admin));
    }
    Ok(state
        .db
        .shares
        .document_role(account_id, document.id)
        .await?)
}

/// Require at least `required` access on a document.
///
/// Callers without any grant get a 404 so shared-nothing users cannot
/// probe for document existence; callers with a weaker grant get a 403.
pub(crate) async fn require_document_role(
    state: &AppState,
    account_id: Uuid,
    document: &Document,
    required: ShareRole,
) -> Result<ShareRole, ApiError> {
    match document_role(state, account_id, document).await? {
        Some(role) if role.allows(required) => Ok(role),
        Some(_) => Err(ApiError::Forbidden(format!(
            "{} access required",
            required
        ))),
        None => Err(ApiError::NotFound(format!(
            "Document {} not found",
            document.id
        ))),
    }
}

/// Require at least `required` access on a collection.
pub(crate) async fn require_collection_role(
    state: &AppState,
    account_id: Uuid,
    collection: &Collection,
    required: ShareRole,
) -> Result<ShareRole, ApiError> {
    if collection.owner_id == account_id {
        return Ok(ShareRole::Admin);
    }
    match state
        .db
        .shares
        .collection_role(account_id, collection.id)
        .await?
    {
        Some(role) if role.allows(required) => Ok(role),
        Some(_) => Err(ApiError::Forbidden(format!(
            "{} access required",
            required
        ))),
        None => Err(ApiError::NotFound(format!(
            "Collection {} not found",
            collection.id
        ))),
    }
}

/// Clamp client pagination to the configured bounds.
pub(crate) fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    use paperstack_core::defaults::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperstack_core::defaults::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    #[test]
    fn test_clamp_page_defaults() {
        assert_eq!(clamp_page(None, None), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_clamp_page_caps_limit() {
        assert_eq!(clamp_page(Some(10_000), None), (MAX_PAGE_SIZE, 0));
        assert_eq!(clamp_page(Some(0), None), (1, 0));
        assert_eq!(clamp_page(Some(-5), None), (1, 0));
    }

    #[test]
    fn test_clamp_page_rejects_negative_offset() {
        assert_eq!(clamp_page(Some(20), Some(-1)), (20, 0));
        assert_eq!(clamp_page(Some(20), Some(40)), (20, 40));
    }
}
