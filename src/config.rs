//! Server configuration
//!
//! Layers, later wins:
//! 1. Built-in defaults
//! 2. TOML file (`snaplink.toml` unless another path is given)
//! 3. `SNAPLINK_*` environment variables (e.g. `SNAPLINK_BOT_TOKEN`)
//!
//! CLI flags are applied on top by the binary.

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "snaplink.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SNAPLINK_";

/// Server configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// None = in-memory database
    pub db_path: Option<String>,
    /// Base of the links handed to users
    pub public_url: String,
    /// Bot API token; HTTP-only when absent
    pub bot_token: Option<String>,
    /// Public base URL for webhook delivery; long-polling when absent
    pub webhook_url: Option<String>,
    /// Keep pending sessions in SQLite instead of process memory
    pub durable_sessions: bool,
    /// Long-poll timeout passed to getUpdates
    pub poll_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 10000)),
            db_path: None,
            public_url: "http://127.0.0.1:10000".to_string(),
            bot_token: None,
            webhook_url: None,
            durable_sessions: true,
            poll_timeout_secs: 30,
        }
    }
}

// Hand-written so the bot token never reaches the logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("public_url", &self.public_url)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("webhook_url", &self.webhook_url)
            .field("durable_sessions", &self.durable_sessions)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Build the layered figment
    pub fn figment(file: Option<&Path>) -> Figment {
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load configuration from defaults, file and environment
    pub fn load(file: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(file).extract()
    }

    /// HTTP timeout for Bot API calls; outlives a long poll
    pub fn telegram_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs + 10)
    }

    /// Where Telegram should deliver updates, if webhooks are enabled
    ///
    /// Needs a bot token to be meaningful, but never embeds it.
    pub fn webhook_endpoint(&self) -> Option<String> {
        let base = self.webhook_url.as_deref()?;
        self.bot_token.as_ref()?;
        Some(format!("{}{}", base.trim_end_matches('/'), crate::api::WEBHOOK_PATH))
    }
}
