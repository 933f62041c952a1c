//! Error taxonomy shared by the session registry and the image store

use thiserror::Error;

use crate::sessions::{SessionId, UserId};

/// Errors raised by the relay core
#[derive(Debug, Error)]
pub enum RelayError {
    /// An image arrived before the user asked for a link
    #[error("user {0} has no pending session")]
    NoPendingSession(UserId),

    /// Nothing is stored under this session id
    #[error("no image stored for session {0}")]
    RecordNotFound(String),

    /// Every candidate token collided with one already in use
    #[error("no unused session id after {0} attempts")]
    NoFreeSessionId(usize),

    /// Underlying SQLite read/write failed
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RelayError {
    /// Shorthand for a missing image record
    pub fn not_found(session_id: &SessionId) -> Self {
        Self::RecordNotFound(session_id.to_string())
    }

    /// Whether the error is a miss rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RelayError::NoPendingSession(_) | RelayError::RecordNotFound(_)
        )
    }
}
