//! Core data models for paperstack.
//!
//! These types are shared across all paperstack crates and represent
//! the domain entities of the document organizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// ACCOUNT TYPES
// =============================================================================

/// A registered user account.
///
/// Accounts are created on first login from a verified identity-provider
/// profile; the provider redirect flow itself lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Stable subject identifier from the identity provider.
    pub provider_subject: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Verified identity profile handed over by the external login flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// An authenticated session resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub account_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// STORAGE TYPES
// =============================================================================

/// Which storage backend holds a document's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    S3,
    Azure,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::S3 => "s3",
            StorageKind::Azure => "azure",
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(StorageKind::Local),
            "s3" => Ok(StorageKind::S3),
            "azure" => Ok(StorageKind::Azure),
            other => Err(Error::InvalidInput(format!(
                "Unknown storage backend: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// A user-uploaded file or note with its metadata and AI-derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_filename: String,
    /// Backend-unique object name, `{uuid}{ext}`.
    pub stored_filename: String,
    pub year: i32,
    pub subject: String,
    pub mimetype: Option<String>,
    pub size_bytes: Option<i64>,
    pub content_hash: Option<String>,
    pub storage_backend: StorageKind,
    /// Text pulled from the file (native for text/plain, external OCR otherwise).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub ai_tags: Vec<String>,
    pub tags: Vec<String>,
    pub view_count: i32,
    pub download_count: i32,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight document view for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub original_filename: String,
    pub year: i32,
    pub subject: String,
    pub mimetype: Option<String>,
    pub size_bytes: Option<i64>,
    pub storage_backend: StorageKind,
    pub tags: Vec<String>,
    pub has_text: bool,
    pub has_summary: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to record a freshly stored upload.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub owner_id: Uuid,
    pub original_filename: String,
    pub stored_filename: String,
    pub year: i32,
    pub subject: String,
    pub mimetype: Option<String>,
    pub size_bytes: i64,
    pub content_hash: Option<String>,
    pub storage_backend: StorageKind,
    pub extracted_text: Option<String>,
    pub tags: Vec<String>,
}

/// Metadata update for an existing document.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    pub year: Option<i32>,
    pub subject: Option<String>,
    /// Full replacement tag set when present.
    pub tags: Option<Vec<String>>,
}

/// Filterable listing request for documents.
#[derive(Debug, Clone, Default)]
pub struct ListDocumentsRequest {
    pub owner_id: Uuid,
    pub year: Option<i32>,
    /// Substring match on subject.
    pub subject: Option<String>,
    /// Every tag must be present on the document.
    pub tags: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Distinct year with its document count (index page data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearBucket {
    pub year: i32,
    pub document_count: i64,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A normalized tag shared across a user's documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Tag with per-user document count, for the tag cloud view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub document_count: i64,
}

// =============================================================================
// COLLECTION TYPES
// =============================================================================

/// A user-defined grouping of documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub document_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for collections.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

// =============================================================================
// SHARING TYPES
// =============================================================================

/// Access level granted by a share.
///
/// Ordered: viewer < editor < admin. The owner holds implicit admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    Viewer,
    Editor,
    Admin,
}

impl ShareRole {
    /// Whether this role satisfies the `required` access level.
    pub fn allows(&self, required: ShareRole) -> bool {
        *self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Viewer => "viewer",
            ShareRole::Editor => "editor",
            ShareRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ShareRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShareRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(ShareRole::Viewer),
            "editor" => Ok(ShareRole::Editor),
            "admin" => Ok(ShareRole::Admin),
            other => Err(Error::InvalidInput(format!("Unknown share role: {}", other))),
        }
    }
}

/// A grant of access on a document or collection to another account.
///
/// Exactly one of `document_id` / `collection_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePermission {
    pub id: Uuid,
    pub document_id: Option<Uuid>,
    pub collection_id: Option<Uuid>,
    pub grantee_id: Uuid,
    pub grantee_email: String,
    pub role: ShareRole,
    pub granted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// COMMENT TYPES
// =============================================================================

/// An annotation on a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub document_id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// STUDY GROUP TYPES
// =============================================================================

/// A study group with shared membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyGroup {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A member entry within a study group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub account_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

// =============================================================================
// NOTIFICATION TYPES
// =============================================================================

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DocumentShared,
    CollectionShared,
    CommentAdded,
    GroupAdded,
    GroupRemoved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::DocumentShared => "document_shared",
            NotificationKind::CollectionShared => "collection_shared",
            NotificationKind::CommentAdded => "comment_added",
            NotificationKind::GroupAdded => "group_added",
            NotificationKind::GroupRemoved => "group_removed",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document_shared" => Ok(NotificationKind::DocumentShared),
            "collection_shared" => Ok(NotificationKind::CollectionShared),
            "comment_added" => Ok(NotificationKind::CommentAdded),
            "group_added" => Ok(NotificationKind::GroupAdded),
            "group_removed" => Ok(NotificationKind::GroupRemoved),
            other => Err(Error::InvalidInput(format!(
                "Unknown notification kind: {}",
                other
            ))),
        }
    }
}

/// A per-user feed entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub document_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CHAT TYPES
// =============================================================================

/// Speaker role within a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(Error::InvalidInput(format!("Unknown chat role: {}", other))),
        }
    }
}

/// A chat conversation, optionally scoped to a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub account_id: Uuid,
    pub document_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ACTIVITY / ANALYTICS TYPES
// =============================================================================

/// Category of a recorded user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Upload,
    View,
    Download,
    Edit,
    Delete,
    Share,
    Comment,
    Summarize,
    Search,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Upload => "upload",
            ActivityKind::View => "view",
            ActivityKind::Download => "download",
            ActivityKind::Edit => "edit",
            ActivityKind::Delete => "delete",
            ActivityKind::Share => "share",
            ActivityKind::Comment => "comment",
            ActivityKind::Summarize => "summarize",
            ActivityKind::Search => "search",
        }
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(ActivityKind::Upload),
            "view" => Ok(ActivityKind::View),
            "download" => Ok(ActivityKind::Download),
            "edit" => Ok(ActivityKind::Edit),
            "delete" => Ok(ActivityKind::Delete),
            "share" => Ok(ActivityKind::Share),
            "comment" => Ok(ActivityKind::Comment),
            "summarize" => Ok(ActivityKind::Summarize),
            "search" => Ok(ActivityKind::Search),
            other => Err(Error::InvalidInput(format!(
                "Unknown activity kind: {}",
                other
            ))),
        }
    }
}

/// One row of the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: ActivityKind,
    pub document_id: Option<Uuid>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Library-wide statistics for a user (stats endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_documents: i64,
    /// Documents with extracted text.
    pub analyzed: i64,
    /// Documents with an AI summary.
    pub summarized: i64,
    /// analyzed / total, in percent; 0 when the library is empty.
    pub coverage_percent: f64,
    pub total_collections: i64,
    pub total_tags: i64,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standardized pagination metadata for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of items matching the query (across all pages).
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    /// True if more items are available after this page.
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}

/// List response wrapper with pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total, limit, offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_share_role_ordering() {
        assert!(ShareRole::Admin.allows(ShareRole::Viewer));
        assert!(ShareRole::Admin.allows(ShareRole::Editor));
        assert!(ShareRole::Editor.allows(ShareRole::Viewer));
        assert!(!ShareRole::Viewer.allows(ShareRole::Editor));
        assert!(!ShareRole::Editor.allows(ShareRole::Admin));
        assert!(ShareRole::Viewer.allows(ShareRole::Viewer));
    }

    #[test]
    fn test_share_role_roundtrip() {
        for role in [ShareRole::Viewer, ShareRole::Editor, ShareRole::Admin] {
            assert_eq!(ShareRole::from_str(role.as_str()).unwrap(), role);
        }
        assert!(ShareRole::from_str("owner").is_err());
    }

    #[test]
    fn test_storage_kind_roundtrip() {
        for kind in [StorageKind::Local, StorageKind::S3, StorageKind::Azure] {
            assert_eq!(StorageKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(StorageKind::from_str("gcs").is_err());
    }

    #[test]
    fn test_storage_kind_serde_lowercase() {
        let json = serde_json::to_string(&StorageKind::Azure).unwrap();
        assert_eq!(json, "\"azure\"");
    }

    #[test]
    fn test_notification_kind_roundtrip() {
        for kind in [
            NotificationKind::DocumentShared,
            NotificationKind::CollectionShared,
            NotificationKind::CommentAdded,
            NotificationKind::GroupAdded,
            NotificationKind::GroupRemoved,
        ] {
            assert_eq!(NotificationKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_activity_kind_roundtrip() {
        for kind in [
            ActivityKind::Upload,
            ActivityKind::View,
            ActivityKind::Download,
            ActivityKind::Edit,
            ActivityKind::Delete,
            ActivityKind::Share,
            ActivityKind::Comment,
            ActivityKind::Summarize,
            ActivityKind::Search,
        ] {
            assert_eq!(ActivityKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_pagination_has_more() {
        let meta = PaginationMeta::new(25, 10, 0);
        assert!(meta.has_more);
        let meta = PaginationMeta::new(25, 10, 20);
        assert!(!meta.has_more);
        let meta = PaginationMeta::new(0, 10, 0);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_page_wraps_data() {
        let page = Page::new(vec![1, 2, 3], 3, 10, 0);
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.pagination.total, 3);
        assert!(!page.pagination.has_more);
    }
}
