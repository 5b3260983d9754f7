//! Account repository implementation.

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{Account, Error, IdentityProfile, Result};

/// PostgreSQL account repository.
pub struct PgAccountRepository {
    pool: Pool<Postgres>,
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        provider_subject: row.get("provider_subject"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
    }
}

impl PgAccountRepository {
    /// Create a new PgAccountRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert an account from a verified identity-provider profile.
    ///
    /// Matches on the provider subject; name/avatar are refreshed on
    /// every login.
    pub async fn upsert_from_profile(&self, profile: &IdentityProfile) -> Result<Account> {
        let row = sqlx::query(
            r#"
            INSERT INTO account (id, email, name, provider_subject, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (provider_subject) DO UPDATE
                SET email = EXCLUDED.email,
                    name = EXCLUDED.name,
                    avatar_url = EXCLUDED.avatar_url
            RETURNING id, email, name, provider_subject, avatar_url, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.subject)
        .bind(&profile.picture)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(account_from_row(&row))
    }

    /// Fetch an account by ID.
    pub async fn fetch(&self, id: Uuid) -> Result<Account> {
        let row = sqlx::query(
            "SELECT id, email, name, provider_subject, avatar_url, created_at
             FROM account WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Account not found: {}", id)))?;

        Ok(account_from_row(&row))
    }

    /// Look up an account by email (share grants, group invites).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, email, name, provider_subject, avatar_url, created_at
             FROM account WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(account_from_row))
    }
}
