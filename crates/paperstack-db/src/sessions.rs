//! Session repository: opaque bearer tokens with hashed storage.
//!
//! Tokens are 64 random characters handed to the client once; only the
//! SHA-256 digest is persisted, so a database leak never yields live
//! credentials.

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{defaults, Error, Result, SessionInfo};

/// Length of a generated session token in characters.
const TOKEN_LENGTH: usize = 64;

/// PostgreSQL session repository.
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Generate a random alphanumeric token.
    fn generate_token() -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..TOKEN_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    /// Hash a token for storage.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a session for an account and return the plaintext token.
    pub async fn create(&self, account_id: Uuid) -> Result<String> {
        let token = Self::generate_token();
        let expires_at = Utc::now() + Duration::days(defaults::SESSION_TTL_DAYS);

        sqlx::query(
            "INSERT INTO session (id, account_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(account_id)
        .bind(Self::hash_token(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(token)
    }

    /// Resolve a bearer token to session info, rejecting expired sessions.
    pub async fn resolve(&self, token: &str) -> Result<SessionInfo> {
        let row = sqlx::query(
            r#"
            SELECT s.account_id, s.expires_at, a.email
            FROM session s
            JOIN account a ON a.id = s.account_id
            WHERE s.token_hash = $1 AND s.expires_at > now()
            "#,
        )
        .bind(Self::hash_token(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(SessionInfo {
            account_id: row.get("account_id"),
            email: row.get("email"),
            expires_at: row.get("expires_at"),
        })
    }

    /// Revoke a session by its plaintext token (logout).
    pub async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE token_hash = $1")
            .bind(Self::hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete expired sessions, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_charset() {
        let token = PgSessionRepository::generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_unique() {
        let a = PgSessionRepository::generate_token();
        let b = PgSessionRepository::generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_stable_hex() {
        let h1 = PgSessionRepository::hash_token("secret");
        let h2 = PgSessionRepository::hash_token("secret");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, PgSessionRepository::hash_token("other"));
    }
}
