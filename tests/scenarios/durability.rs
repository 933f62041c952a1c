//! Durability scenario tests
//!
//! Pending sessions survive a restart only with the SQLite registry.
//! Stored images always do.

use crate::harness::TestServer;
use snaplink::relay::Outcome;

const IMG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xDB, 0x01, 0x02];

/// Test: durable registry keeps a pending session across restart
#[tokio::test]
async fn test_pending_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("relay.db");

    let server = TestServer::start_on_disk(&db_path, true).await.unwrap();
    let session = server.get_link(42).await;
    server.stop().await;

    let server = TestServer::start_on_disk(&db_path, true).await.unwrap();
    let reply = server.send_image(42, IMG).await;
    assert_eq!(reply.outcome, Outcome::ImageShared(session.clone()));

    let resp = server.get(&format!("/view/{}", session)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG);
}

/// Test: memory registry drops pending sessions on restart
#[tokio::test]
async fn test_memory_sessions_lost_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("relay.db");

    let server = TestServer::start_on_disk(&db_path, false).await.unwrap();
    server.get_link(42).await;
    server.stop().await;

    let server = TestServer::start_on_disk(&db_path, false).await.unwrap();
    let reply = server.send_image(42, IMG).await;
    assert_eq!(reply.outcome, Outcome::NeedsSession);
}

/// Test: stored images outlive the process
#[tokio::test]
async fn test_images_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("relay.db");

    let server = TestServer::start_on_disk(&db_path, false).await.unwrap();
    let session = server.get_link(1).await;
    server.send_image(1, IMG).await;
    server.stop().await;

    let server = TestServer::start_on_disk(&db_path, false).await.unwrap();
    let resp = server.get(&format!("/view/{}", session)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG);
}
