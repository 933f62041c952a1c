//! Telegram glue
//!
//! Provides:
//! - Bot API client (getUpdates, sendMessage, getFile, webhooks)
//! - Update dispatch into the relay core
//! - Long-poll loop for deployments without a public webhook

mod client;
mod types;

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::relay::{BotEvent, Relay, Reply};
use crate::sessions::{SessionState, UserId};

pub use client::{TelegramClient, TelegramError, DEFAULT_API_URL};
pub use types::{classify, Chat, File, Incoming, Message, PhotoSize, Update, User};

#[cfg(test)]
pub(crate) use client::mock;

/// Delay before retrying a failed `getUpdates`
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Secret Telegram must present on webhook deliveries
///
/// Derived from the bot token so it needs no extra configuration, without
/// the token itself ever appearing in a URL or header.
pub fn webhook_secret(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"snaplink-webhook:");
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Handle one update: decode, run through the relay, reply
///
/// Photos are only downloaded when the sender is awaiting an image.
pub async fn dispatch(relay: &Relay, client: &TelegramClient, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let Some(from) = message.from.as_ref() else {
        return;
    };
    let user = UserId(from.id);

    let event = match classify(&message) {
        Incoming::Start => BotEvent::Start,
        Incoming::GetLink => BotEvent::GetLink,
        Incoming::Text => BotEvent::Text,
        Incoming::Photo(file_id) => match relay.registry().state(user).await {
            Ok(SessionState::Idle) => BotEvent::ImageUnavailable,
            Ok(SessionState::AwaitingImage(_)) => match client.download_photo(&file_id).await {
                Ok(data) => BotEvent::Image(data),
                Err(e) => {
                    warn!("Failed to download photo for user {}: {}", user, e);
                    BotEvent::ImageUnavailable
                }
            },
            Err(e) => {
                error!("Error reading session state for user {}: {}", user, e);
                send_reply(client, message.chat.id, &Reply::storage_failure()).await;
                return;
            }
        },
        Incoming::Other => {
            debug!("Ignoring message {} from user {}", message.message_id, user);
            return;
        }
    };

    let reply = relay.handle(user, event).await;
    send_reply(client, message.chat.id, &reply).await;
}

async fn send_reply(client: &TelegramClient, chat_id: i64, reply: &Reply) {
    if let Err(e) = client.send_message(chat_id, &reply.text).await {
        warn!("Failed to reply to chat {}: {}", chat_id, e);
    }
}

/// Poll `getUpdates` until shutdown is signalled
pub async fn run_polling(
    relay: Arc<Relay>,
    client: Arc<TelegramClient>,
    timeout_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = client.delete_webhook().await {
        warn!("Could not clear webhook before polling: {}", e);
    }
    info!("Telegram long-polling started");

    let mut offset: Option<i64> = None;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            result = client.get_updates(offset, timeout_secs) => match result {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        dispatch(&relay, &client, update).await;
                    }
                }
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            },
        }
    }

    info!("Telegram long-polling stopped");
}
