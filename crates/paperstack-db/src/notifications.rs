//! Notification repository implementation.

use std::str::FromStr;

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{Error, Notification, NotificationKind, Result};

/// PostgreSQL notification repository.
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

fn notification_from_row(row: &sqlx::postgres::PgRow) -> Result<Notification> {
    let kind: String = row.get("kind");
    Ok(Notification {
        id: row.get("id"),
        account_id: row.get("account_id"),
        kind: NotificationKind::from_str(&kind)?,
        message: row.get("message"),
        document_id: row.get("document_id"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

impl PgNotificationRepository {
    /// Create a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Deliver a notification to an account's feed.
    pub async fn insert(
        &self,
        account_id: Uuid,
        kind: NotificationKind,
        message: &str,
        document_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO notification (id, account_id, kind, message, document_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(account_id)
        .bind(kind.as_str())
        .bind(message)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    /// An account's notifications, newest first, optionally unread only.
    pub async fn list(
        &self,
        account_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, kind, message, document_id, read, created_at
            FROM notification
            WHERE account_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(account_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(notification_from_row).collect()
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, account_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS unread FROM notification
             WHERE account_id = $1 AND read = FALSE",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("unread"))
    }

    /// Mark one notification read. Scoped by account so users cannot
    /// touch each other's feeds.
    pub async fn mark_read(&self, id: Uuid, account_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notification SET read = TRUE WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Notification not found: {}", id)));
        }
        Ok(())
    }

    /// Mark all of an account's notifications read; returns how many changed.
    pub async fn mark_all_read(&self, account_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notification SET read = TRUE WHERE account_id = $1 AND read = FALSE",
        )
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
