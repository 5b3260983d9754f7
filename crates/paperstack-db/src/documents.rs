//! Document repository implementation.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{
    normalize_tags, slugify, CreateDocumentRequest, Document, DocumentRepository, DocumentSummary,
    Error, ListDocumentsRequest, Page, Result, StorageKind, UpdateDocumentRequest, YearBucket,
};

use crate::escape_like;

/// PostgreSQL implementation of DocumentRepository.
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

fn storage_kind(row: &sqlx::postgres::PgRow) -> Result<StorageKind> {
    let raw: String = row.get("storage_backend");
    StorageKind::from_str(&raw)
}

fn document_from_row(row: &sqlx::postgres::PgRow) -> Result<Document> {
    let tags: Option<Vec<String>> = row.get("tags");
    Ok(Document {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        original_filename: row.get("original_filename"),
        stored_filename: row.get("stored_filename"),
        year: row.get("year"),
        subject: row.get("subject"),
        mimetype: row.get("mimetype"),
        size_bytes: row.get("size_bytes"),
        content_hash: row.get("content_hash"),
        storage_backend: storage_kind(row)?,
        extracted_text: row.get("extracted_text"),
        summary: row.get("summary"),
        ai_tags: row.get("ai_tags"),
        tags: tags.unwrap_or_default(),
        view_count: row.get("view_count"),
        download_count: row.get("download_count"),
        last_accessed_at: row.get("last_accessed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn summary_from_row(row: &sqlx::postgres::PgRow) -> Result<DocumentSummary> {
    let tags: Option<Vec<String>> = row.get("tags");
    Ok(DocumentSummary {
        id: row.get("id"),
        original_filename: row.get("original_filename"),
        year: row.get("year"),
        subject: row.get("subject"),
        mimetype: row.get("mimetype"),
        size_bytes: row.get("size_bytes"),
        storage_backend: storage_kind(row)?,
        tags: tags.unwrap_or_default(),
        has_text: row.get("has_text"),
        has_summary: row.get("has_summary"),
        created_at: row.get("created_at"),
    })
}

/// Columns selected for the lightweight list view. `tg.names` is a lateral
/// aggregate of the document's tag names.
const SUMMARY_COLUMNS: &str = r#"
    d.id, d.original_filename, d.year, d.subject, d.mimetype, d.size_bytes,
    d.storage_backend, tg.names AS tags,
    (d.extracted_text IS NOT NULL) AS has_text,
    (d.summary IS NOT NULL) AS has_summary,
    d.created_at
"#;

const TAGS_LATERAL: &str = r#"
    LEFT JOIN LATERAL (
        SELECT array_agg(t.name ORDER BY t.name) AS names
        FROM document_tag dt
        JOIN tag t ON t.id = dt.tag_id
        WHERE dt.document_id = d.id
    ) tg ON TRUE
"#;

/// Write the given tag set for a document inside an open transaction,
/// replacing any existing links.
pub(crate) async fn write_document_tags(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    document_id: Uuid,
    tags: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM document_tag WHERE document_id = $1")
        .bind(document_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

    for name in normalize_tags(tags) {
        let slug = slugify(&name);
        let tag_id: Uuid = sqlx::query(
            r#"
            INSERT INTO tag (id, name, slug) VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&name)
        .bind(&slug)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?
        .get("id");

        sqlx::query(
            "INSERT INTO document_tag (document_id, tag_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(document_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    }

    Ok(())
}

impl PgDocumentRepository {
    /// Create a new PgDocumentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Plain text search across filename, subject, extracted text, and
    /// summary for one owner's library.
    pub async fn text_search(
        &self,
        owner_id: Uuid,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<DocumentSummary>> {
        let pattern = format!("%{}%", escape_like(query));

        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM document d
            WHERE d.owner_id = $1
              AND (d.original_filename ILIKE $2
                   OR d.subject ILIKE $2
                   OR d.extracted_text ILIKE $2
                   OR d.summary ILIKE $2)
            "#,
        )
        .bind(owner_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?
        .get("total");

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS} FROM document d
            {TAGS_LATERAL}
            WHERE d.owner_id = $1
              AND (d.original_filename ILIKE $2
                   OR d.subject ILIKE $2
                   OR d.extracted_text ILIKE $2
                   OR d.summary ILIKE $2)
            ORDER BY d.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let docs = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(docs, total, limit, offset))
    }

    /// Extracted texts for one owner's library, for similarity indexing.
    pub async fn corpus(&self, owner_id: Uuid) -> Result<Vec<(Uuid, String)>> {
        let rows = sqlx::query(
            "SELECT id, extracted_text FROM document
             WHERE owner_id = $1 AND extracted_text IS NOT NULL
             ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("id"), row.get("extracted_text")))
            .collect())
    }

    /// Paginated documents carrying a tag, by slug.
    pub async fn list_by_tag(
        &self,
        owner_id: Uuid,
        slug: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<DocumentSummary>> {
        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM document d
            JOIN document_tag dt ON dt.document_id = d.id
            JOIN tag t ON t.id = dt.tag_id
            WHERE d.owner_id = $1 AND t.slug = $2
            "#,
        )
        .bind(owner_id)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?
        .get("total");

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS} FROM document d
            JOIN document_tag dt ON dt.document_id = d.id
            JOIN tag t ON t.id = dt.tag_id
            {TAGS_LATERAL}
            WHERE d.owner_id = $1 AND t.slug = $2
            ORDER BY d.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner_id)
        .bind(slug)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let docs = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(docs, total, limit, offset))
    }

    /// Lightweight summaries for an explicit ID set (related-documents view).
    pub async fn summaries_by_ids(&self, ids: &[Uuid]) -> Result<Vec<DocumentSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS} FROM document d
            {TAGS_LATERAL}
            WHERE d.id = ANY($1)
            "#
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(summary_from_row).collect()
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            r#"
            INSERT INTO document (
                id, owner_id, original_filename, stored_filename, year, subject,
                mimetype, size_bytes, content_hash, storage_backend, extracted_text
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(req.owner_id)
        .bind(&req.original_filename)
        .bind(&req.stored_filename)
        .bind(req.year)
        .bind(&req.subject)
        .bind(&req.mimetype)
        .bind(req.size_bytes)
        .bind(&req.content_hash)
        .bind(req.storage_backend.as_str())
        .bind(&req.extracted_text)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if !req.tags.is_empty() {
            write_document_tags(&mut tx, id, &req.tags).await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Document> {
        let row = sqlx::query(&format!(
            r#"
            SELECT d.*, tg.names AS tags FROM document d
            {TAGS_LATERAL}
            WHERE d.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::DocumentNotFound(id))?;

        document_from_row(&row)
    }

    async fn list(&self, req: ListDocumentsRequest) -> Result<Page<DocumentSummary>> {
        let subject_pattern = req
            .subject
            .as_deref()
            .map(|s| format!("%{}%", escape_like(s)));
        let tag_slugs: Vec<String> = req.tags.iter().map(|t| slugify(t)).collect();

        // Tag filter requires every slug in $4 to be present on the document.
        let filter = r#"
            d.owner_id = $1
            AND ($2::int IS NULL OR d.year = $2)
            AND ($3::text IS NULL OR d.subject ILIKE $3)
            AND (cardinality($4::text[]) = 0 OR d.id IN (
                SELECT dt.document_id FROM document_tag dt
                JOIN tag t ON t.id = dt.tag_id
                WHERE t.slug = ANY($4)
                GROUP BY dt.document_id
                HAVING COUNT(DISTINCT t.slug) = cardinality($4::text[])
            ))
        "#;

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM document d WHERE {filter}"
        ))
        .bind(req.owner_id)
        .bind(req.year)
        .bind(&subject_pattern)
        .bind(&tag_slugs)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?
        .get("total");

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS} FROM document d
            {TAGS_LATERAL}
            WHERE {filter}
            ORDER BY d.created_at DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(req.owner_id)
        .bind(req.year)
        .bind(&subject_pattern)
        .bind(&tag_slugs)
        .bind(req.limit)
        .bind(req.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let docs = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(docs, total, req.limit, req.offset))
    }

    async fn update(&self, id: Uuid, req: UpdateDocumentRequest) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query(
            r#"
            UPDATE document
            SET year = COALESCE($2, year),
                subject = COALESCE($3, subject),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.year)
        .bind(&req.subject)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }

        if let Some(tags) = &req.tags {
            write_document_tags(&mut tx, id, tags).await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<()> {
        // New text invalidates any summary derived from the old text.
        let result = sqlx::query(
            "UPDATE document
             SET extracted_text = $2, summary = NULL, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn update_summary(&self, id: Uuid, summary: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE document SET summary = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(summary)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn update_ai_tags(&self, id: Uuid, tags: &[String]) -> Result<()> {
        let result =
            sqlx::query("UPDATE document SET ai_tags = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(tags)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM document WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn record_view(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE document
             SET view_count = view_count + 1, last_accessed_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn record_download(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE document
             SET download_count = download_count + 1, last_accessed_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn year_buckets(&self, owner_id: Uuid) -> Result<Vec<YearBucket>> {
        let rows = sqlx::query(
            "SELECT year, COUNT(*) AS document_count FROM document
             WHERE owner_id = $1
             GROUP BY year ORDER BY year",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| YearBucket {
                year: row.get("year"),
                document_count: row.get("document_count"),
            })
            .collect())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM document WHERE id = $1) AS found")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("found"))
    }
}
