//! Session registry
//!
//! Maps a messaging-platform user to at most one pending upload session.
//! A session is created by `/getlink` and consumed once an image is
//! attached. Creating a new session for the same user replaces the old
//! one; the replaced id is orphaned and can never receive an image.
//!
//! Two backends implement [`SessionRegistry`]:
//! - [`MemorySessionRegistry`] - process-local map, lost on restart
//! - [`SqliteSessionRegistry`] - `pending_sessions` table, survives restart

mod memory;
mod sqlite;

use std::fmt;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use sqlx::SqlitePool;

use crate::error::RelayError;

pub use memory::MemorySessionRegistry;
pub use sqlite::SqliteSessionRegistry;

/// Length of a session token
pub const SESSION_ID_LEN: usize = 8;

/// Characters a session token is drawn from (36^8, about 41 bits)
pub const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Fresh candidates tried before `create_session` gives up
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Source of candidate tokens; swapped out in tests
pub type IdGenerator = Arc<dyn Fn() -> SessionId + Send + Sync>;

/// Generator backed by the thread-local RNG
pub fn random_ids() -> IdGenerator {
    Arc::new(SessionId::generate)
}

static SESSION_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]{8}$").unwrap());

/// Opaque user identity from the messaging platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short URL-safe token correlating one link request to one upload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random token
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let token = (0..SESSION_ID_LEN)
            .map(|_| {
                let i = rng.random_range(0..SESSION_ID_ALPHABET.len());
                SESSION_ID_ALPHABET[i] as char
            })
            .collect();
        Self(token)
    }

    /// Parse a token from untrusted input (URL path, database row)
    ///
    /// Accepts exactly what [`SessionId::generate`] can produce: 8 lowercase
    /// alphanumerics. Anything else is malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        SESSION_ID_REGEX
            .is_match(raw)
            .then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-user lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No pending session; images are rejected with an instruction
    Idle,
    /// A link was issued and the next image will be stored under it
    AwaitingImage(SessionId),
}

impl SessionState {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, SessionState::AwaitingImage(_))
    }
}

/// Capability to create and consume pending sessions
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Issue a fresh session for `user`, replacing any pending one
    async fn create_session(&self, user: UserId) -> Result<SessionId, RelayError>;

    /// Remove and return the pending session for `user`
    ///
    /// Fails with [`RelayError::NoPendingSession`] when the user is idle.
    async fn consume_session(&self, user: UserId) -> Result<SessionId, RelayError>;

    /// Remove the pending session for `user` only if it is still `session`
    ///
    /// Returns `false` when the user is idle or has since been issued a
    /// different session, which then stays pending.
    async fn consume_if(&self, user: UserId, session: &SessionId) -> Result<bool, RelayError>;

    /// Inspect the user's state without changing it
    async fn state(&self, user: UserId) -> Result<SessionState, RelayError>;
}

/// Pick a registry backend
///
/// `durable = true` keeps pending sessions in SQLite next to the images so a
/// restart does not drop them.
pub fn registry_for(durable: bool, pool: SqlitePool) -> Arc<dyn SessionRegistry> {
    if durable {
        Arc::new(SqliteSessionRegistry::new(pool))
    } else {
        Arc::new(MemorySessionRegistry::new())
    }
}
