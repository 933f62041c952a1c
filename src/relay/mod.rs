//! Relay core
//!
//! Ties the session registry to the image store and turns bot events into
//! replies. Per user the flow is `Idle --/getlink--> AwaitingImage
//! --image--> Idle`; a second `/getlink` while awaiting replaces the token.

pub mod replies;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::RelayError;
use crate::images::{ImageRecord, ImageStore};
use crate::sessions::{SessionId, SessionRegistry, SessionState, UserId, MAX_ID_ATTEMPTS};

/// Inbound event from the messaging platform, already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// `/start`
    Start,
    /// `/getlink`
    GetLink,
    /// A photo whose bytes were downloaded
    Image(Vec<u8>),
    /// A photo arrived but its bytes were not fetched
    ImageUnavailable,
    /// Any other text
    Text,
}

/// What a handled event resulted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Help,
    LinkIssued(SessionId),
    ImageShared(SessionId),
    NeedsSession,
    Failed,
    Hint,
}

/// Reply to send back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub outcome: Outcome,
    pub text: String,
}

impl Reply {
    fn new(outcome: Outcome, text: impl Into<String>) -> Self {
        Self {
            outcome,
            text: text.into(),
        }
    }

    /// Generic failure reply for when the relay's storage is unreachable
    pub fn storage_failure() -> Self {
        Self::new(Outcome::Failed, replies::IMAGE_FAILED)
    }
}

/// Session registry plus blob store, addressed by public URL
pub struct Relay {
    registry: Arc<dyn SessionRegistry>,
    images: ImageStore,
    public_url: String,
}

impl Relay {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        images: ImageStore,
        public_url: impl Into<String>,
    ) -> Self {
        let public_url = public_url.into().trim_end_matches('/').to_string();
        Self {
            registry,
            images,
            public_url,
        }
    }

    pub fn registry(&self) -> &Arc<dyn SessionRegistry> {
        &self.registry
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Public link for a session
    pub fn view_url(&self, session_id: &SessionId) -> String {
        format!("{}/view/{}", self.public_url, session_id)
    }

    /// Issue a new session for `user`
    ///
    /// A token that already names a stored image is replaced by a fresh one,
    /// whichever registry backend issued it.
    pub async fn create_session(&self, user: UserId) -> Result<SessionId, RelayError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let session = self.registry.create_session(user).await?;
            if !self.images.exists(&session).await? {
                info!("User {} opened session {}", user, session);
                return Ok(session);
            }
            warn!("Session id {} already names an image, re-rolling", session);
            // Never leave the user pointed at someone else's image
            self.registry.consume_if(user, &session).await?;
        }

        Err(RelayError::NoFreeSessionId(MAX_ID_ATTEMPTS))
    }

    /// Store `data` under the user's pending session and consume it
    ///
    /// The pending entry is only removed once the write has succeeded, so a
    /// storage failure leaves the user free to resend the image. A link
    /// issued while the write was in flight stays pending.
    pub async fn attach_image(&self, user: UserId, data: &[u8]) -> Result<SessionId, RelayError> {
        let session = match self.registry.state(user).await? {
            SessionState::AwaitingImage(session) => session,
            SessionState::Idle => return Err(RelayError::NoPendingSession(user)),
        };

        self.images.put(&session, data).await?;
        if !self.registry.consume_if(user, &session).await? {
            info!(
                "User {} requested a new link while session {} was being stored",
                user, session
            );
        }

        info!(
            "User {} attached {} bytes to session {}",
            user,
            data.len(),
            session
        );
        Ok(session)
    }

    /// Look up an image by the raw id from a URL
    ///
    /// Malformed ids are reported exactly like unknown ones.
    pub async fn fetch(&self, raw_session_id: &str) -> Result<ImageRecord, RelayError> {
        let session = SessionId::parse(raw_session_id)
            .ok_or_else(|| RelayError::RecordNotFound(raw_session_id.to_string()))?;
        self.images.get(&session).await
    }

    /// Handle one bot event and produce the reply for the user
    pub async fn handle(&self, user: UserId, event: BotEvent) -> Reply {
        match event {
            BotEvent::Start => Reply::new(Outcome::Help, replies::WELCOME),
            BotEvent::GetLink => match self.create_session(user).await {
                Ok(session) => {
                    let text = replies::link_issued(session.as_str(), &self.view_url(&session));
                    Reply::new(Outcome::LinkIssued(session), text)
                }
                Err(e) => {
                    error!("Error creating session for user {}: {}", user, e);
                    Reply::new(Outcome::Failed, replies::SESSION_FAILED)
                }
            },
            BotEvent::Image(data) => match self.attach_image(user, &data).await {
                Ok(session) => {
                    let text = replies::image_shared(&self.view_url(&session));
                    Reply::new(Outcome::ImageShared(session), text)
                }
                Err(RelayError::NoPendingSession(_)) => {
                    Reply::new(Outcome::NeedsSession, replies::NEEDS_SESSION)
                }
                Err(e) => {
                    error!("Error handling image: {}", e);
                    Reply::storage_failure()
                }
            },
            BotEvent::ImageUnavailable => match self.registry.state(user).await {
                Ok(SessionState::AwaitingImage(_)) => Reply::storage_failure(),
                Ok(SessionState::Idle) => Reply::new(Outcome::NeedsSession, replies::NEEDS_SESSION),
                Err(e) => {
                    error!("Error reading session state for user {}: {}", user, e);
                    Reply::storage_failure()
                }
            },
            BotEvent::Text => Reply::new(Outcome::Hint, replies::HINT),
        }
    }
}
