//! Activity log and library statistics.

use std::str::FromStr;

use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{ActivityEntry, ActivityKind, Error, LibraryStats, Result};

/// PostgreSQL activity repository.
pub struct PgActivityRepository {
    pool: Pool<Postgres>,
}

impl PgActivityRepository {
    /// Create a new PgActivityRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record one user action. Failures here are the caller's choice to
    /// ignore; analytics must never break the primary operation.
    pub async fn record(
        &self,
        account_id: Uuid,
        kind: ActivityKind,
        document_id: Option<Uuid>,
        metadata: JsonValue,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO activity_log (id, account_id, kind, document_id, metadata)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(account_id)
        .bind(kind.as_str())
        .bind(document_id)
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Most recent activity for an account.
    pub async fn recent(&self, account_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>> {
        let rows = sqlx::query(
            "SELECT id, account_id, kind, document_id, metadata, created_at
             FROM activity_log
             WHERE account_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let kind: String = row.get("kind");
                Ok(ActivityEntry {
                    id: row.get("id"),
                    account_id: row.get("account_id"),
                    kind: ActivityKind::from_str(&kind)?,
                    document_id: row.get("document_id"),
                    metadata: row.get("metadata"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    /// Library-wide statistics for an account.
    pub async fn library_stats(&self, account_id: Uuid) -> Result<LibraryStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM document WHERE owner_id = $1) AS total_documents,
                (SELECT COUNT(*) FROM document
                 WHERE owner_id = $1 AND extracted_text IS NOT NULL) AS analyzed,
                (SELECT COUNT(*) FROM document
                 WHERE owner_id = $1 AND summary IS NOT NULL) AS summarized,
                (SELECT COUNT(*) FROM collection WHERE owner_id = $1) AS total_collections,
                (SELECT COUNT(DISTINCT dt.tag_id)
                 FROM document_tag dt
                 JOIN document d ON d.id = dt.document_id
                 WHERE d.owner_id = $1) AS total_tags
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let total_documents: i64 = row.get("total_documents");
        let analyzed: i64 = row.get("analyzed");
        let coverage_percent = if total_documents > 0 {
            (analyzed as f64 / total_documents as f64) * 100.0
        } else {
            0.0
        };

        Ok(LibraryStats {
            total_documents,
            analyzed,
            summarized: row.get("summarized"),
            coverage_percent,
            total_collections: row.get("total_collections"),
            total_tags: row.get("total_tags"),
        })
    }
}
