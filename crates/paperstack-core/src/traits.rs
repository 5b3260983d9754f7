//! Repository traits for paperstack abstractions.
//!
//! These traits define the interfaces the database layer implements,
//! enabling pluggable storage and testability for the core entities.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Repository for document CRUD and analytics operations.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a freshly stored upload and return its ID.
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Uuid>;

    /// Fetch a full document by ID.
    async fn fetch(&self, id: Uuid) -> Result<Document>;

    /// List documents with filtering and pagination.
    async fn list(&self, req: ListDocumentsRequest) -> Result<Page<DocumentSummary>>;

    /// Update document metadata (year, subject, tags).
    async fn update(&self, id: Uuid, req: UpdateDocumentRequest) -> Result<()>;

    /// Replace extracted text and clear any stale summary.
    async fn update_text(&self, id: Uuid, text: &str) -> Result<()>;

    /// Store an AI-generated summary.
    async fn update_summary(&self, id: Uuid, summary: &str) -> Result<()>;

    /// Store AI-suggested tags alongside user tags.
    async fn update_ai_tags(&self, id: Uuid, tags: &[String]) -> Result<()>;

    /// Delete a document row (blob deletion is the caller's concern).
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Record a view: bump view_count and touch last_accessed_at.
    async fn record_view(&self, id: Uuid) -> Result<()>;

    /// Record a download: bump download_count and touch last_accessed_at.
    async fn record_download(&self, id: Uuid) -> Result<()>;

    /// Distinct years with document counts for an owner.
    async fn year_buckets(&self, owner_id: Uuid) -> Result<Vec<YearBucket>>;

    /// Check if a document exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

/// Repository for tag management.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Get or create a tag by normalized name, returning its ID.
    async fn ensure(&self, name: &str) -> Result<Uuid>;

    /// Replace the full tag set on a document.
    async fn set_document_tags(&self, document_id: Uuid, tags: &[String]) -> Result<()>;

    /// Tags on a single document, ordered by name.
    async fn for_document(&self, document_id: Uuid) -> Result<Vec<Tag>>;

    /// All tags used by an owner's documents, with counts.
    async fn list_with_counts(&self, owner_id: Uuid) -> Result<Vec<TagWithCount>>;
}

// =============================================================================
// COLLECTION REPOSITORY
// =============================================================================

/// Repository for collection CRUD and membership.
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// Create a collection and return its ID.
    async fn insert(&self, owner_id: Uuid, input: CollectionInput) -> Result<Uuid>;

    /// Fetch a collection with its document count.
    async fn fetch(&self, id: Uuid) -> Result<Collection>;

    /// List an owner's collections, newest first.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Collection>>;

    /// Update name/description/color/icon.
    async fn update(&self, id: Uuid, input: CollectionInput) -> Result<()>;

    /// Delete a collection; member documents survive.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Add a document to a collection (idempotent).
    async fn add_document(&self, collection_id: Uuid, document_id: Uuid) -> Result<()>;

    /// Remove a document from a collection.
    async fn remove_document(&self, collection_id: Uuid, document_id: Uuid) -> Result<()>;

    /// Documents in a collection, newest first.
    async fn documents(&self, collection_id: Uuid) -> Result<Vec<DocumentSummary>>;
}
