//! # paperstack-db
//!
//! PostgreSQL database layer for paperstack.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - Session token issuance with hashed storage
//! - Per-user library statistics and an activity log
//!
//! ## Example
//!
//! ```rust,ignore
//! use paperstack_db::Database;
//! use paperstack_core::DocumentRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/paperstack").await?;
//!     db.migrate().await?;
//!
//!     let doc = db.documents.fetch(some_id).await?;
//!     println!("{}", doc.original_filename);
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod activity;
pub mod chat;
pub mod collections;
pub mod comments;
pub mod documents;
pub mod groups;
pub mod notifications;
pub mod pool;
pub mod sessions;
pub mod shares;
pub mod tags;

// Re-export core types
pub use paperstack_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use accounts::PgAccountRepository;
pub use activity::PgActivityRepository;
pub use chat::PgChatRepository;
pub use collections::PgCollectionRepository;
pub use comments::PgCommentRepository;
pub use documents::PgDocumentRepository;
pub use groups::PgGroupRepository;
pub use notifications::PgNotificationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use sessions::PgSessionRepository;
pub use shares::PgShareRepository;
pub use tags::PgTagRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Account repository.
    pub accounts: PgAccountRepository,
    /// Session token repository.
    pub sessions: PgSessionRepository,
    /// Document repository for CRUD and analytics counters.
    pub documents: PgDocumentRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// Collection repository.
    pub collections: PgCollectionRepository,
    /// Share permission repository.
    pub shares: PgShareRepository,
    /// Comment repository.
    pub comments: PgCommentRepository,
    /// Study group repository.
    pub groups: PgGroupRepository,
    /// Notification feed repository.
    pub notifications: PgNotificationRepository,
    /// Chat session and message repository.
    pub chat: PgChatRepository,
    /// Activity log and library statistics.
    pub activity: PgActivityRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            accounts: PgAccountRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            documents: PgDocumentRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            collections: PgCollectionRepository::new(pool.clone()),
            shares: PgShareRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            groups: PgGroupRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            chat: PgChatRepository::new(pool.clone()),
            activity: PgActivityRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
