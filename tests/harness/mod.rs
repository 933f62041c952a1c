//! Integration Test Harness
//!
//! `TestServer` runs a real snaplink `Server` on a random port and talks to
//! it over HTTP with reqwest. Bot traffic is driven through the server's
//! relay core directly, so no Telegram account is needed.
//!
//! # Example
//!
//! ```rust,ignore
//! let server = TestServer::start().await.unwrap();
//! let session = server.get_link(42).await;
//! server.send_image(42, b"...").await;
//! let resp = server.get(&format!("/view/{}", session)).await.unwrap();
//! assert_eq!(resp.status(), 200);
//! ```

mod server;

pub use server::TestServer;
