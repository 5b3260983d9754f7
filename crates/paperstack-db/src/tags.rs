//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{
    normalize_tag, slugify, Error, Result, Tag, TagRepository, TagWithCount,
};

use crate::documents::write_document_tags;

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn ensure(&self, name: &str) -> Result<Uuid> {
        let name = normalize_tag(name)
            .ok_or_else(|| Error::InvalidInput(format!("Invalid tag name: {:?}", name)))?;
        let slug = slugify(&name);

        // The no-op update makes RETURNING fire on conflict too.
        let row = sqlx::query(
            r#"
            INSERT INTO tag (id, name, slug) VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&name)
        .bind(&slug)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    async fn set_document_tags(&self, document_id: Uuid, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        write_document_tags(&mut tx, document_id, tags).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn for_document(&self, document_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.slug, t.created_at
            FROM tag t
            JOIN document_tag dt ON dt.tag_id = t.id
            WHERE dt.document_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn list_with_counts(&self, owner_id: Uuid) -> Result<Vec<TagWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.slug, COUNT(d.id) AS document_count
            FROM tag t
            JOIN document_tag dt ON dt.tag_id = t.id
            JOIN document d ON d.id = dt.document_id
            WHERE d.owner_id = $1
            GROUP BY t.id, t.name, t.slug
            ORDER BY document_count DESC, t.name
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TagWithCount {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
                document_count: row.get("document_count"),
            })
            .collect())
    }
}
