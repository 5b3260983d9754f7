//! Collection repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{
    defaults, Collection, CollectionInput, CollectionRepository, DocumentSummary, Error, Result,
};

/// PostgreSQL implementation of CollectionRepository.
pub struct PgCollectionRepository {
    pool: Pool<Postgres>,
}

fn collection_from_row(row: &sqlx::postgres::PgRow) -> Collection {
    Collection {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        color: row.get("color"),
        icon: row.get("icon"),
        document_count: row.get("document_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const COLLECTION_COLUMNS: &str = r#"
    c.id, c.owner_id, c.name, c.description, c.color, c.icon,
    c.created_at, c.updated_at,
    (SELECT COUNT(*) FROM collection_document cd
     WHERE cd.collection_id = c.id) AS document_count
"#;

impl PgCollectionRepository {
    /// Create a new PgCollectionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Add multiple documents in one transaction; returns how many were
    /// newly linked (already-present documents are skipped).
    pub async fn add_documents(&self, collection_id: Uuid, document_ids: &[Uuid]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut added = 0u64;

        for doc_id in document_ids {
            let result = sqlx::query(
                "INSERT INTO collection_document (collection_id, document_id)
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(collection_id)
            .bind(doc_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
            added += result.rows_affected();
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(added)
    }

    /// Whether a document belongs to a collection.
    pub async fn contains(&self, collection_id: Uuid, document_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM collection_document
                WHERE collection_id = $1 AND document_id = $2
            ) AS found",
        )
        .bind(collection_id)
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("found"))
    }
}

#[async_trait]
impl CollectionRepository for PgCollectionRepository {
    async fn insert(&self, owner_id: Uuid, input: CollectionInput) -> Result<Uuid> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "Collection name cannot be empty".to_string(),
            ));
        }

        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO collection (id, owner_id, name, description, color, icon)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(&input.description)
        .bind(input.color.as_deref().unwrap_or(defaults::COLLECTION_COLOR))
        .bind(input.icon.as_deref().unwrap_or(defaults::COLLECTION_ICON))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Collection> {
        let row = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collection c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::CollectionNotFound(id))?;

        Ok(collection_from_row(&row))
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Collection>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collection c
             WHERE c.owner_id = $1
             ORDER BY c.created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(collection_from_row).collect())
    }

    async fn update(&self, id: Uuid, input: CollectionInput) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE collection
            SET name = $2,
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                icon = COALESCE($5, icon),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.color)
        .bind(&input.icon)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::CollectionNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // The join table cascades; documents themselves are untouched.
        let result = sqlx::query("DELETE FROM collection WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::CollectionNotFound(id));
        }
        Ok(())
    }

    async fn add_document(&self, collection_id: Uuid, document_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO collection_document (collection_id, document_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(collection_id)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn remove_document(&self, collection_id: Uuid, document_id: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM collection_document
             WHERE collection_id = $1 AND document_id = $2",
        )
        .bind(collection_id)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn documents(&self, collection_id: Uuid) -> Result<Vec<DocumentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT
                d.id, d.original_filename, d.year, d.subject, d.mimetype,
                d.size_bytes, d.storage_backend, tg.names AS tags,
                (d.extracted_text IS NOT NULL) AS has_text,
                (d.summary IS NOT NULL) AS has_summary,
                d.created_at
            FROM document d
            JOIN collection_document cd ON cd.document_id = d.id
            LEFT JOIN LATERAL (
                SELECT array_agg(t.name ORDER BY t.name) AS names
                FROM document_tag dt
                JOIN tag t ON t.id = dt.tag_id
                WHERE dt.document_id = d.id
            ) tg ON TRUE
            WHERE cd.collection_id = $1
            ORDER BY cd.added_at DESC
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let tags: Option<Vec<String>> = row.get("tags");
                let raw: String = row.get("storage_backend");
                Ok(DocumentSummary {
                    id: row.get("id"),
                    original_filename: row.get("original_filename"),
                    year: row.get("year"),
                    subject: row.get("subject"),
                    mimetype: row.get("mimetype"),
                    size_bytes: row.get("size_bytes"),
                    storage_backend: raw.parse()?,
                    tags: tags.unwrap_or_default(),
                    has_text: row.get("has_text"),
                    has_summary: row.get("has_summary"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
