//! TestServer - end-to-end test harness
//!
//! Spawns an in-process server bound to a random port. Each instance gets
//! its own database: in-memory by default, or a file under a temp
//! directory when a test needs to restart against the same data.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use snaplink::relay::{BotEvent, Outcome, Reply};
use snaplink::sessions::{SessionId, UserId};
use snaplink::{Config, Server};
use tokio::task::JoinHandle;

/// Test harness around a running server
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start with an in-memory database
    pub async fn start() -> Result<Self> {
        Self::start_with(Config::default()).await
    }

    /// Start against a database file, choosing the session backend
    pub async fn start_on_disk(db_path: &Path, durable_sessions: bool) -> Result<Self> {
        let config = Config {
            db_path: Some(db_path.to_string_lossy().into_owned()),
            durable_sessions,
            ..Config::default()
        };
        Self::start_with(config).await
    }

    /// Start with an explicit config; bind address and public URL are overridden
    pub async fn start_with(mut config: Config) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        config.bind_addr = addr;
        config.public_url = format!("http://{}", addr);
        config.bot_token = None;

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 5 seconds)
        let mut ready = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 5 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            handle: Some(handle),
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Deliver a bot event as `user`
    pub async fn bot(&self, user: i64, event: BotEvent) -> Reply {
        self.server.relay().handle(UserId(user), event).await
    }

    /// `/getlink` as `user`, returning the issued session
    pub async fn get_link(&self, user: i64) -> SessionId {
        match self.bot(user, BotEvent::GetLink).await.outcome {
            Outcome::LinkIssued(session) => session,
            other => panic!("expected a link, got {:?}", other),
        }
    }

    /// Send an image as `user`
    pub async fn send_image(&self, user: i64, data: &[u8]) -> Reply {
        self.bot(user, BotEvent::Image(data.to_vec())).await
    }

    /// Stop the server and wait for it to release the database
    pub async fn stop(mut self) {
        self.server.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
