//! Process-local session registry

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{
    random_ids, IdGenerator, SessionId, SessionRegistry, SessionState, UserId, MAX_ID_ATTEMPTS,
};
use crate::error::RelayError;

/// Pending sessions held in memory; dropped when the process exits
pub struct MemorySessionRegistry {
    pending: Mutex<HashMap<UserId, SessionId>>,
    ids: IdGenerator,
}

impl MemorySessionRegistry {
    pub fn new() -> Self {
        Self::with_generator(random_ids())
    }

    /// Registry drawing candidate tokens from `ids`
    pub fn with_generator(ids: IdGenerator) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ids,
        }
    }

    /// Number of users currently awaiting an image
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for MemorySessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn create_session(&self, user: UserId) -> Result<SessionId, RelayError> {
        let mut pending = self.pending.lock();

        for _ in 0..MAX_ID_ATTEMPTS {
            let session = (self.ids)();
            // Re-issuing the user's own pending token is a collision too
            if pending.values().any(|s| *s == session) {
                debug!("Session id {} already pending, re-rolling", session);
                continue;
            }
            if let Some(old) = pending.insert(user, session.clone()) {
                debug!("Session {} for user {} orphaned by {}", old, user, session);
            }
            return Ok(session);
        }

        Err(RelayError::NoFreeSessionId(MAX_ID_ATTEMPTS))
    }

    async fn consume_session(&self, user: UserId) -> Result<SessionId, RelayError> {
        self.pending
            .lock()
            .remove(&user)
            .ok_or(RelayError::NoPendingSession(user))
    }

    async fn consume_if(&self, user: UserId, session: &SessionId) -> Result<bool, RelayError> {
        let mut pending = self.pending.lock();
        if pending.get(&user) != Some(session) {
            return Ok(false);
        }
        Ok(pending.remove_entry(&user).is_some())
    }

    async fn state(&self, user: UserId) -> Result<SessionState, RelayError> {
        Ok(match self.pending.lock().get(&user) {
            Some(session) => SessionState::AwaitingImage(session.clone()),
            None => SessionState::Idle,
        })
    }
}
