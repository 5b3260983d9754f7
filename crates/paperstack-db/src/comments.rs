//! Comment repository implementation.

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{Comment, Error, Result};

/// PostgreSQL comment repository.
pub struct PgCommentRepository {
    pool: Pool<Postgres>,
}

fn comment_from_row(row: &sqlx::postgres::PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        document_id: row.get("document_id"),
        author_id: row.get("author_id"),
        author_name: row.get("author_name"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const COMMENT_COLUMNS: &str = r#"
    c.id, c.document_id, c.author_id,
    COALESCE(a.name, a.email) AS author_name,
    c.body, c.created_at, c.updated_at
"#;

impl PgCommentRepository {
    /// Create a new PgCommentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Add a comment to a document.
    pub async fn insert(&self, document_id: Uuid, author_id: Uuid, body: &str) -> Result<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::InvalidInput("Comment cannot be empty".to_string()));
        }

        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO comment (id, document_id, author_id, body) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(document_id)
            .bind(author_id)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        self.fetch(id).await
    }

    /// Fetch a comment by ID.
    pub async fn fetch(&self, id: Uuid) -> Result<Comment> {
        let row = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comment c
             JOIN account a ON a.id = c.author_id
             WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Comment not found: {}", id)))?;

        Ok(comment_from_row(&row))
    }

    /// Comments on a document, oldest first.
    pub async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comment c
             JOIN account a ON a.id = c.author_id
             WHERE c.document_id = $1
             ORDER BY c.created_at"
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// Delete a comment.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM comment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Comment not found: {}", id)));
        }
        Ok(())
    }
}
