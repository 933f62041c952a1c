//! SQLite-backed session registry

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::{
    random_ids, IdGenerator, SessionId, SessionRegistry, SessionState, UserId, MAX_ID_ATTEMPTS,
};
use crate::error::RelayError;

/// Pending sessions persisted in the `pending_sessions` table
#[derive(Clone)]
pub struct SqliteSessionRegistry {
    pool: SqlitePool,
    ids: IdGenerator,
}

impl SqliteSessionRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_generator(pool, random_ids())
    }

    /// Registry drawing candidate tokens from `ids`
    pub fn with_generator(pool: SqlitePool, ids: IdGenerator) -> Self {
        Self { pool, ids }
    }
}

/// Decode a stored token, treating a corrupt row as absent
fn decode(user: UserId, raw: String) -> Option<SessionId> {
    let parsed = SessionId::parse(&raw);
    if parsed.is_none() {
        warn!("Ignoring malformed pending session {:?} for user {}", raw, user);
    }
    parsed
}

#[async_trait]
impl SessionRegistry for SqliteSessionRegistry {
    async fn create_session(&self, user: UserId) -> Result<SessionId, RelayError> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        // A token is taken if it is pending for anyone or already names an image
        let mut session = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = (self.ids)();
            let (taken,): (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM images WHERE session_id = ?)
                     OR EXISTS(SELECT 1 FROM pending_sessions WHERE session_id = ?)",
            )
            .bind(candidate.as_str())
            .bind(candidate.as_str())
            .fetch_one(&mut *tx)
            .await?;

            if !taken {
                session = Some(candidate);
                break;
            }
            debug!("Session id {} already in use, re-rolling", candidate);
        }
        let session = session.ok_or(RelayError::NoFreeSessionId(MAX_ID_ATTEMPTS))?;

        sqlx::query(
            "INSERT INTO pending_sessions (user_id, session_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET session_id = excluded.session_id, created_at = excluded.created_at",
        )
        .bind(user.0)
        .bind(session.as_str())
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!("Created session {} for user {}", session, user);
        Ok(session)
    }

    async fn consume_session(&self, user: UserId) -> Result<SessionId, RelayError> {
        let row: Option<(String,)> =
            sqlx::query_as("DELETE FROM pending_sessions WHERE user_id = ? RETURNING session_id")
                .bind(user.0)
                .fetch_optional(&self.pool)
                .await?;

        row.and_then(|(raw,)| decode(user, raw))
            .ok_or(RelayError::NoPendingSession(user))
    }

    async fn consume_if(&self, user: UserId, session: &SessionId) -> Result<bool, RelayError> {
        let result =
            sqlx::query("DELETE FROM pending_sessions WHERE user_id = ? AND session_id = ?")
                .bind(user.0)
                .bind(session.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn state(&self, user: UserId) -> Result<SessionState, RelayError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT session_id FROM pending_sessions WHERE user_id = ?")
                .bind(user.0)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match row.and_then(|(raw,)| decode(user, raw)) {
            Some(session) => SessionState::AwaitingImage(session),
            None => SessionState::Idle,
        })
    }
}
