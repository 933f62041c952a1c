//! Telegram webhook endpoint
//!
//! POST /telegram/webhook - Updates pushed by Telegram when webhooks are on.
//! Calls are authenticated by the secret registered with `setWebhook`, so
//! the bot token never appears in the request path or the access log.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use tracing::warn;

use super::AppState;
use crate::telegram::{self, Update};

/// Header Telegram uses to echo the webhook secret
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Fixed path Telegram delivers updates to
pub const WEBHOOK_PATH: &str = "/telegram/webhook";

/// Build the webhook router
pub fn router() -> Router<AppState> {
    Router::new().route(WEBHOOK_PATH, post(receive_update))
}

/// Accept an update and process it off the request path
async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    let Some(bot) = state.bot.clone() else {
        return StatusCode::NOT_FOUND;
    };
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if presented != Some(&*bot.secret) {
        warn!("Rejected webhook call without a valid secret");
        return StatusCode::UNAUTHORIZED;
    }

    let relay = state.relay.clone();
    tokio::spawn(async move {
        telegram::dispatch(&relay, &bot.client, update).await;
    });
    StatusCode::OK
}
