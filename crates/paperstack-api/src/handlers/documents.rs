//! Document upload, metadata, download, and preview handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use paperstack_core::{
    defaults, detect_content_type, file_extension, is_native_text, parse_tag_csv, preview_kind,
    sanitize_filename, ActivityKind, CreateDocumentRequest, Document, DocumentRepository, Error,
    ListDocumentsRequest, PreviewKind, ShareRole, UpdateDocumentRequest,
};
use paperstack_storage::{compute_content_hash, document_path};

use super::{clamp_page, require_document_role};
use crate::{ApiError, AppState, RequireAuth};

// =============================================================================
// UPLOAD
// =============================================================================

/// POST /api/v1/documents
///
/// Multipart upload of one or more files plus year/subject/tags fields.
/// Each file succeeds or fails independently; the response reports
/// per-file results so a batch with one oversized file still lands the
/// rest.
pub async fn upload_documents(
    State(state): State<AppState>,
    auth: RequireAuth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut year: Option<i32> = None;
    let mut subject: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("files") | Some("file") => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "unnamed_file".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?
                    .to_vec();
                files.push((filename, data));
            }
            Some("year") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid year field: {}", e)))?;
                year = Some(text.trim().parse().map_err(|_| {
                    ApiError::BadRequest(format!("year must be an integer, got '{}'", text.trim()))
                })?);
            }
            Some("subject") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid subject field: {}", e)))?;
                subject = Some(text.trim().to_string());
            }
            Some("tags") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid tags field: {}", e)))?;
                tags = parse_tag_csv(&text);
            }
            _ => {}
        }
    }

    let year = year.ok_or_else(|| ApiError::BadRequest("year is required".to_string()))?;
    let subject = subject
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("subject is required".to_string()))?;
    if files.is_empty() {
        return Err(ApiError::BadRequest(
            "No files uploaded. Use field name 'files'.".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(files.len());
    for (filename, data) in files {
        match store_upload(
            &state,
            auth.session.account_id,
            &filename,
            data,
            None,
            year,
            &subject,
            &tags,
        )
        .await
        {
            Ok(id) => results.push(json!({
                "filename": filename,
                "status": "success",
                "document_id": id,
            })),
            Err(e) => results.push(json!({
                "filename": filename,
                "status": "error",
                "error": e.to_string(),
            })),
        }
    }

    Ok((StatusCode::CREATED, Json(json!({ "results": results }))))
}

/// Store a single upload: blob first (with cloud-to-local fallback
/// inside the router), then the metadata row, then the activity entry.
#[allow(clippy::too_many_arguments)]
async fn store_upload(
    state: &AppState,
    owner_id: Uuid,
    filename: &str,
    data: Vec<u8>,
    claimed_mime: Option<&str>,
    year: i32,
    subject: &str,
    tags: &[String],
) -> paperstack_core::Result<Uuid> {
    if data.is_empty() {
        return Err(Error::InvalidInput("File is empty".to_string()));
    }
    if data.len() > defaults::MAX_UPLOAD_BYTES {
        return Err(Error::InvalidInput(format!(
            "File exceeds the {} MB limit",
            defaults::MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    let mimetype = detect_content_type(&data, claimed_mime);
    let path = document_path(Uuid::now_v7(), &file_extension(filename));
    let backend = state.storage.store(&path, &data).await?;
    let content_hash = compute_content_hash(&data);

    let extracted_text = if is_native_text(Some(&mimetype)) {
        Some(String::from_utf8_lossy(&data).into_owned())
    } else {
        None
    };

    let size_bytes = data.len() as i64;
    let id = state
        .db
        .documents
        .insert(CreateDocumentRequest {
            owner_id,
            original_filename: filename.to_string(),
            stored_filename: path,
            year,
            subject: subject.to_string(),
            mimetype: Some(mimetype),
            size_bytes,
            content_hash: Some(content_hash),
            storage_backend: backend,
            extracted_text,
            tags: tags.to_vec(),
        })
        .await?;

    state
        .db
        .activity
        .record(
            owner_id,
            ActivityKind::Upload,
            Some(id),
            json!({ "filename": filename, "size_bytes": size_bytes }),
        )
        .await?;

    info!(
        subsystem = "api",
        op = "upload",
        document_id = %id,
        size_bytes,
        storage_backend = %backend,
        "Document stored"
    );
    Ok(id)
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub year: i32,
    pub subject: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /api/v1/notes
///
/// Quick-note creation: the content is stored as a text/plain document
/// with the extracted text already populated.
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }
    if req.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("subject is required".to_string()));
    }

    let filename = sanitize_filename(&format!("{}.txt", title));
    let id = store_upload(
        &state,
        auth.session.account_id,
        &filename,
        req.content.into_bytes(),
        Some("text/plain"),
        req.year,
        req.subject.trim(),
        &req.tags,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "document_id": id }))))
}

// =============================================================================
// LISTING AND METADATA
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub year: Option<i32>,
    pub subject: Option<String>,
    /// Comma-separated tag filter; every tag must match.
    pub tags: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/documents
pub async fn list_documents(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = clamp_page(query.limit, query.offset);
    let page = state
        .db
        .documents
        .list(ListDocumentsRequest {
            owner_id: auth.session.account_id,
            year: query.year,
            subject: query.subject.filter(|s| !s.trim().is_empty()),
            tags: query.tags.as_deref().map(parse_tag_csv).unwrap_or_default(),
            limit,
            offset,
        })
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/years
pub async fn list_years(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let buckets = state
        .db
        .documents
        .year_buckets(auth.session.account_id)
        .await?;
    Ok(Json(buckets))
}

/// GET /api/v1/documents/:id
pub async fn get_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;
    Ok(Json(document))
}

/// PATCH /api/v1/documents/:id
pub async fn update_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Editor).await?;

    state.db.documents.update(id, req).await?;
    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Edit,
            Some(id),
            json!({}),
        )
        .await?;

    let updated = state.db.documents.fetch(id).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/documents/:id
///
/// Blob first, row second. A failed blob delete is logged but does not
/// keep the row alive; orphaned blobs are cheaper than ghost rows.
pub async fn delete_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Admin).await?;

    if let Err(e) = state
        .storage
        .delete(document.storage_backend, &document.stored_filename)
        .await
    {
        warn!(
            subsystem = "api",
            op = "delete",
            document_id = %id,
            error = %e,
            "Blob delete failed, removing row anyway"
        );
    }

    state.db.documents.delete(id).await?;
    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Delete,
            None,
            json!({ "filename": document.original_filename }),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PutTextRequest {
    pub text: String,
}

/// PUT /api/v1/documents/:id/text
///
/// The external text extractor posts OCR output here. Replacing the
/// text clears any stale summary.
pub async fn put_document_text(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<PutTextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Editor).await?;

    state.db.documents.update_text(id, &req.text).await?;
    Ok(Json(json!({ "status": "updated" })))
}

// =============================================================================
// DOWNLOAD AND PREVIEW
// =============================================================================

fn content_type_header(document: &Document) -> HeaderValue {
    document
        .mimetype
        .as_deref()
        .and_then(|m| HeaderValue::from_str(m).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"))
}

/// GET /api/v1/documents/:id/download
///
/// Local blobs are served directly with a content-disposition header;
/// cloud blobs redirect to a short-lived presigned URL.
pub async fn download_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;

    state.db.documents.record_download(id).await?;
    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::Download,
            Some(id),
            json!({}),
        )
        .await?;

    let url = state
        .storage
        .signed_url(
            document.storage_backend,
            &document.stored_filename,
            defaults::DOWNLOAD_URL_EXPIRY_SECS,
        )
        .await?;

    if let Some(url) = url {
        let location = HeaderValue::from_str(&url)
            .map_err(|_| ApiError::Internal(Error::Internal("Invalid signed URL".to_string())))?;
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    }

    let data = state
        .storage
        .read(document.storage_backend, &document.stored_filename)
        .await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        document.original_filename.replace('"', "")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_header(&document)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// GET /api/v1/documents/:id/preview
///
/// Returns what the client needs to render the document inline: the
/// extracted text for text files, a fetchable URL for images and PDFs.
/// Counts as a view.
pub async fn preview_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;

    state.db.documents.record_view(id).await?;
    state
        .db
        .activity
        .record(
            auth.session.account_id,
            ActivityKind::View,
            Some(id),
            json!({}),
        )
        .await?;

    let kind = preview_kind(document.mimetype.as_deref(), &document.original_filename);
    let body = match kind {
        PreviewKind::Text => json!({
            "kind": kind,
            "text_content": document.extracted_text,
        }),
        PreviewKind::Image | PreviewKind::Pdf => {
            let url = state
                .storage
                .signed_url(
                    document.storage_backend,
                    &document.stored_filename,
                    defaults::PREVIEW_URL_EXPIRY_SECS,
                )
                .await?
                .unwrap_or_else(|| format!("/api/v1/documents/{}/raw", id));
            json!({ "kind": kind, "file_url": url })
        }
        PreviewKind::Other => json!({ "kind": kind }),
    };

    Ok(Json(body))
}

/// GET /api/v1/documents/:id/raw
///
/// Inline byte serving for blobs without a URL scheme (local backend).
pub async fn raw_document(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_role(&state, auth.session.account_id, &document, ShareRole::Viewer).await?;

    let data = state
        .storage
        .read(document.storage_backend, &document.stored_filename)
        .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_header(&document))],
        data,
    )
        .into_response())
}
