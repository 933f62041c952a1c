//! HTTP API module - landing page, health, image links, webhook

mod pages;
mod view;
mod webhook;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::relay::Relay;
use crate::telegram::TelegramClient;

pub use webhook::{SECRET_HEADER, WEBHOOK_PATH};

/// Bot client plus the secret webhook deliveries must carry
#[derive(Clone)]
pub struct BotState {
    pub client: Arc<TelegramClient>,
    pub secret: Arc<str>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub relay: Arc<Relay>,
    pub bot: Option<BotState>,
}

/// Build the API router
///
/// The webhook route is only mounted when `webhook` is set.
pub fn router(state: AppState, webhook: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(view::router());

    if webhook {
        router = router.merge(webhook::router());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Landing page
async fn root() -> Html<&'static str> {
    Html(pages::HOME)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}
