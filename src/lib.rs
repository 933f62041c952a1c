//! snaplink - Telegram image relay
//!
//! A user asks the bot for a link, sends one image, and anyone holding the
//! link can view it over HTTP. Pending sessions and images live in SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod relay;
pub mod sessions;
pub mod telegram;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use api::{AppState, BotState};
use db::Database;
use images::ImageStore;
use relay::Relay;
use telegram::TelegramClient;

pub use config::Config;
pub use error::RelayError;

/// The snaplink server instance
pub struct Server {
    config: Config,
    db: Arc<Database>,
    relay: Arc<Relay>,
    telegram: Option<Arc<TelegramClient>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(config.db_path.as_deref()).await?;
        let pool = db.pool().clone();

        let registry = sessions::registry_for(config.durable_sessions, pool.clone());
        let relay = Relay::new(registry, ImageStore::new(pool), config.public_url.clone());

        let telegram = match config.bot_token.as_deref() {
            Some(token) => Some(Arc::new(TelegramClient::new(
                token,
                config.telegram_timeout(),
            )?)),
            None => None,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            db: Arc::new(db),
            relay: Arc::new(relay),
            telegram,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the database handle
    pub fn db(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Get the relay core
    pub fn relay(&self) -> Arc<Relay> {
        self.relay.clone()
    }

    /// Build the router
    fn router(&self) -> Router {
        let bot = match (&self.telegram, self.config.bot_token.as_deref()) {
            (Some(client), Some(token)) => Some(BotState {
                client: client.clone(),
                secret: Arc::from(telegram::webhook_secret(token)),
            }),
            _ => None,
        };
        let state = AppState {
            db: self.db.clone(),
            relay: self.relay.clone(),
            bot,
        };
        api::router(state, self.config.webhook_endpoint().is_some())
    }

    /// Register the webhook or start long-polling, depending on config
    async fn start_bot(&self) -> Result<()> {
        let Some(client) = self.telegram.clone() else {
            warn!("No bot token configured; serving HTTP only");
            return Ok(());
        };

        match (self.config.webhook_endpoint(), self.config.bot_token.as_deref()) {
            (Some(endpoint), Some(token)) => {
                client
                    .set_webhook(&endpoint, &telegram::webhook_secret(token))
                    .await?;
                info!("Telegram webhook registered");
            }
            _ => {
                tokio::spawn(telegram::run_polling(
                    self.relay.clone(),
                    client,
                    self.config.poll_timeout_secs,
                    self.shutdown_rx.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("snaplink listening on {}", local_addr);

        self.start_bot().await?;

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("snaplink shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
