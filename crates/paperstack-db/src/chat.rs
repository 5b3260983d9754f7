//! Chat session and message repository.

use std::str::FromStr;

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{ChatMessage, ChatRole, ChatSession, Error, Result};

/// PostgreSQL chat repository.
pub struct PgChatRepository {
    pool: Pool<Postgres>,
}

fn session_from_row(row: &sqlx::postgres::PgRow) -> ChatSession {
    ChatSession {
        id: row.get("id"),
        account_id: row.get("account_id"),
        document_id: row.get("document_id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn message_from_row(row: &sqlx::postgres::PgRow) -> Result<ChatMessage> {
    let role: String = row.get("role");
    Ok(ChatMessage {
        id: row.get("id"),
        session_id: row.get("session_id"),
        role: ChatRole::from_str(&role)?,
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}

impl PgChatRepository {
    /// Create a new PgChatRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Start a new chat session, optionally scoped to a document.
    pub async fn create_session(
        &self,
        account_id: Uuid,
        document_id: Option<Uuid>,
        title: &str,
    ) -> Result<ChatSession> {
        let id = Uuid::now_v7();
        let row = sqlx::query(
            r#"
            INSERT INTO chat_session (id, account_id, document_id, title)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_id, document_id, title, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(document_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(session_from_row(&row))
    }

    /// Fetch a session by ID.
    pub async fn fetch_session(&self, id: Uuid) -> Result<ChatSession> {
        let row = sqlx::query(
            "SELECT id, account_id, document_id, title, created_at, updated_at
             FROM chat_session WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Chat session not found: {}", id)))?;

        Ok(session_from_row(&row))
    }

    /// An account's sessions, most recently active first.
    pub async fn list_sessions(&self, account_id: Uuid) -> Result<Vec<ChatSession>> {
        let rows = sqlx::query(
            "SELECT id, account_id, document_id, title, created_at, updated_at
             FROM chat_session
             WHERE account_id = $1
             ORDER BY updated_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    /// Delete a session and its messages.
    pub async fn delete_session(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM chat_session WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Chat session not found: {}", id)));
        }
        Ok(())
    }

    /// Append a message and touch the session's updated_at.
    pub async fn add_message(
        &self,
        session_id: Uuid,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            r#"
            INSERT INTO chat_message (id, session_id, role, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, role, content, created_at
            "#,
        )
        .bind(id)
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("UPDATE chat_session SET updated_at = now() WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        message_from_row(&row)
    }

    /// All messages in a session, oldest first.
    pub async fn messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, session_id, role, content, created_at
             FROM chat_message
             WHERE session_id = $1
             ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(message_from_row).collect()
    }
}
