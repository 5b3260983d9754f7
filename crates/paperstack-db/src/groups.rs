//! Study group repository implementation.

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paperstack_core::{Error, GroupMember, Result, StudyGroup};

/// PostgreSQL study group repository.
pub struct PgGroupRepository {
    pool: Pool<Postgres>,
}

fn group_from_row(row: &sqlx::postgres::PgRow) -> StudyGroup {
    StudyGroup {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        member_count: row.get("member_count"),
        created_at: row.get("created_at"),
    }
}

const GROUP_COLUMNS: &str = r#"
    g.id, g.owner_id, g.name, g.description, g.created_at,
    (SELECT COUNT(*) FROM group_member gm WHERE gm.group_id = g.id) AS member_count
"#;

impl PgGroupRepository {
    /// Create a new PgGroupRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a group; the owner is also enrolled as a member.
    pub async fn insert(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Group name cannot be empty".to_string()));
        }

        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("INSERT INTO study_group (id, owner_id, name, description) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(owner_id)
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("INSERT INTO group_member (group_id, account_id) VALUES ($1, $2)")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    /// Fetch a group by ID.
    pub async fn fetch(&self, id: Uuid) -> Result<StudyGroup> {
        let row = sqlx::query(&format!(
            "SELECT {GROUP_COLUMNS} FROM study_group g WHERE g.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Group not found: {}", id)))?;

        Ok(group_from_row(&row))
    }

    /// Groups an account belongs to, newest first.
    pub async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<StudyGroup>> {
        let rows = sqlx::query(&format!(
            "SELECT {GROUP_COLUMNS} FROM study_group g
             JOIN group_member m ON m.group_id = g.id
             WHERE m.account_id = $1
             ORDER BY g.created_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(group_from_row).collect())
    }

    /// Delete a group.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM study_group WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Group not found: {}", id)));
        }
        Ok(())
    }

    /// Enroll an account (idempotent).
    pub async fn add_member(&self, group_id: Uuid, account_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO group_member (group_id, account_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Remove a member.
    pub async fn remove_member(&self, group_id: Uuid, account_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM group_member WHERE group_id = $1 AND account_id = $2")
            .bind(group_id)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Account {} is not a member of group {}",
                account_id, group_id
            )));
        }
        Ok(())
    }

    /// Members of a group, ordered by join time.
    pub async fn members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
        let rows = sqlx::query(
            r#"
            SELECT m.account_id, a.email, a.name, m.joined_at
            FROM group_member m
            JOIN account a ON a.id = m.account_id
            WHERE m.group_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| GroupMember {
                account_id: row.get("account_id"),
                email: row.get("email"),
                name: row.get("name"),
                joined_at: row.get("joined_at"),
            })
            .collect())
    }

    /// Whether an account belongs to a group.
    pub async fn is_member(&self, group_id: Uuid, account_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM group_member WHERE group_id = $1 AND account_id = $2
            ) AS found",
        )
        .bind(group_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("found"))
    }
}
