//! Share permission repository.
//!
//! A share grants one account a role on a single document or collection.
//! Access to a document can also arrive indirectly through a share on a
//! collection that contains it; `document_role` resolves both paths.

use std::str::FromStr;

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{Error, Result, SharePermission, ShareRole};

/// PostgreSQL share repository.
pub struct PgShareRepository {
    pool: Pool<Postgres>,
}

fn share_from_row(row: &sqlx::postgres::PgRow) -> Result<SharePermission> {
    let role: String = row.get("role");
    Ok(SharePermission {
        id: row.get("id"),
        document_id: row.get("document_id"),
        collection_id: row.get("collection_id"),
        grantee_id: row.get("grantee_id"),
        grantee_email: row.get("grantee_email"),
        role: ShareRole::from_str(&role)?,
        granted_by: row.get("granted_by"),
        created_at: row.get("created_at"),
    })
}

const SHARE_COLUMNS: &str = r#"
    s.id, s.document_id, s.collection_id, s.grantee_id,
    a.email AS grantee_email, s.role, s.granted_by, s.created_at
"#;

impl PgShareRepository {
    /// Create a new PgShareRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Grant a role on a document. Re-granting to the same account
    /// updates the role.
    pub async fn grant_document(
        &self,
        document_id: Uuid,
        grantee_id: Uuid,
        role: ShareRole,
        granted_by: Uuid,
    ) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO share_permission (id, document_id, grantee_id, role, granted_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (document_id, grantee_id) WHERE document_id IS NOT NULL
                DO UPDATE SET role = EXCLUDED.role
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(document_id)
        .bind(grantee_id)
        .bind(role.as_str())
        .bind(granted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    /// Grant a role on a collection.
    pub async fn grant_collection(
        &self,
        collection_id: Uuid,
        grantee_id: Uuid,
        role: ShareRole,
        granted_by: Uuid,
    ) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO share_permission (id, collection_id, grantee_id, role, granted_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (collection_id, grantee_id) WHERE collection_id IS NOT NULL
                DO UPDATE SET role = EXCLUDED.role
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(collection_id)
        .bind(grantee_id)
        .bind(role.as_str())
        .bind(granted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    /// Fetch a share by ID.
    pub async fn fetch(&self, id: Uuid) -> Result<SharePermission> {
        let row = sqlx::query(&format!(
            "SELECT {SHARE_COLUMNS} FROM share_permission s
             JOIN account a ON a.id = s.grantee_id
             WHERE s.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Share not found: {}", id)))?;

        share_from_row(&row)
    }

    /// All grants on a document.
    pub async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<SharePermission>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHARE_COLUMNS} FROM share_permission s
             JOIN account a ON a.id = s.grantee_id
             WHERE s.document_id = $1
             ORDER BY s.created_at"
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(share_from_row).collect()
    }

    /// All grants on a collection.
    pub async fn list_for_collection(&self, collection_id: Uuid) -> Result<Vec<SharePermission>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHARE_COLUMNS} FROM share_permission s
             JOIN account a ON a.id = s.grantee_id
             WHERE s.collection_id = $1
             ORDER BY s.created_at"
        ))
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(share_from_row).collect()
    }

    /// Incoming grants for an account (shared-with-me view).
    pub async fn list_for_grantee(&self, grantee_id: Uuid) -> Result<Vec<SharePermission>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHARE_COLUMNS} FROM share_permission s
             JOIN account a ON a.id = s.grantee_id
             WHERE s.grantee_id = $1
             ORDER BY s.created_at DESC"
        ))
        .bind(grantee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(share_from_row).collect()
    }

    /// Revoke a share.
    pub async fn revoke(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM share_permission WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Share not found: {}", id)));
        }
        Ok(())
    }

    /// Highest role an account holds on a document, through a direct
    /// share or any shared collection containing it. `None` means no
    /// grant exists (owner access is resolved by the caller).
    pub async fn document_role(
        &self,
        account_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<ShareRole>> {
        let rows = sqlx::query(
            r#"
            SELECT s.role FROM share_permission s
            WHERE s.grantee_id = $1
              AND (s.document_id = $2
                   OR s.collection_id IN (
                       SELECT collection_id FROM collection_document
                       WHERE document_id = $2
                   ))
            "#,
        )
        .bind(account_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut best: Option<ShareRole> = None;
        for row in rows {
            let role: String = row.get("role");
            let role = ShareRole::from_str(&role)?;
            if best.map_or(true, |b| role > b) {
                best = Some(role);
            }
        }
        Ok(best)
    }

    /// Role an account holds on a collection through a direct share.
    pub async fn collection_role(
        &self,
        account_id: Uuid,
        collection_id: Uuid,
    ) -> Result<Option<ShareRole>> {
        let row = sqlx::query(
            "SELECT role FROM share_permission
             WHERE grantee_id = $1 AND collection_id = $2",
        )
        .bind(account_id)
        .bind(collection_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => {
                let role: String = row.get("role");
                Ok(Some(ShareRole::from_str(&role)?))
            }
            None => Ok(None),
        }
    }
}
