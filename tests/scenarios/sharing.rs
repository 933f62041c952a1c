//! Sharing scenario tests

use crate::harness::TestServer;
use snaplink::relay::{replies, BotEvent, Outcome};

const IMG_A: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
const IMG_B: &[u8] = b"\x89PNG\r\n\x1a\n-second-image";

/// Test: link, upload, view, then relink leaves the old image reachable
#[tokio::test]
async fn test_share_and_relink() {
    let server = TestServer::start().await.expect("Failed to start server");

    let first = server.get_link(42).await;
    let reply = server.send_image(42, IMG_A).await;
    assert_eq!(reply.outcome, Outcome::ImageShared(first.clone()));
    assert!(reply
        .text
        .contains(&format!("{}/view/{}", server.base_url(), first)));

    let resp = server.get(&format!("/view/{}", first)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/jpeg");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG_A);

    // Second link for the same user
    let second = server.get_link(42).await;
    assert_ne!(first, second);

    // Old record is orphaned but still served
    let resp = server.get(&format!("/view/{}", first)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG_A);

    // New link has nothing yet
    let resp = server.get(&format!("/view/{}", second)).await.unwrap();
    assert_eq!(resp.status(), 404);

    server.send_image(42, IMG_B).await;
    let resp = server.get(&format!("/view/{}", second)).await.unwrap();
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG_B);
}

/// Test: an image without a link is refused with an instruction
#[tokio::test]
async fn test_image_before_link() {
    let server = TestServer::start().await.expect("Failed to start server");

    let reply = server.send_image(7, IMG_A).await;
    assert_eq!(reply.outcome, Outcome::NeedsSession);
    assert_eq!(reply.text, replies::NEEDS_SESSION);
}

/// Test: one link accepts exactly one image
#[tokio::test]
async fn test_link_is_single_use() {
    let server = TestServer::start().await.expect("Failed to start server");

    let session = server.get_link(5).await;
    server.send_image(5, IMG_A).await;
    let reply = server.send_image(5, IMG_B).await;
    assert_eq!(reply.outcome, Outcome::NeedsSession);

    let resp = server.get(&format!("/view/{}", session)).await.unwrap();
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG_A);
}

/// Test: users do not see each other's sessions
#[tokio::test]
async fn test_users_are_isolated() {
    let server = TestServer::start().await.expect("Failed to start server");

    let alice = server.get_link(1).await;
    let bob = server.get_link(2).await;

    server.send_image(2, IMG_B).await;
    server.send_image(1, IMG_A).await;

    let resp = server.get(&format!("/view/{}", alice)).await.unwrap();
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG_A);
    let resp = server.get(&format!("/view/{}", bob)).await.unwrap();
    assert_eq!(resp.bytes().await.unwrap().as_ref(), IMG_B);
}

/// Test: help and hint replies
#[tokio::test]
async fn test_help_and_hint() {
    let server = TestServer::start().await.expect("Failed to start server");

    let reply = server.bot(9, BotEvent::Start).await;
    assert_eq!(reply.outcome, Outcome::Help);

    let reply = server.bot(9, BotEvent::Text).await;
    assert_eq!(reply.outcome, Outcome::Hint);
}
