//! Database fixtures for unit tests
//!
//! Every test gets its own private in-memory SQLite with the migrations
//! applied, so the registry and image store are checked against the real
//! `images` and `pending_sessions` tables.

use sqlx::SqlitePool;

use super::Database;

/// Fresh migrated in-memory database
pub async fn test_pool() -> SqlitePool {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    db.pool().clone()
}
