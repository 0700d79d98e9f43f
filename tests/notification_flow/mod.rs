use std::net::SocketAddr;
use std::sync::Arc;

use pac_relay::api_routes;
use pac_relay::constants::ALREADY_ATTACHED_MSG;
use pac_relay::constants::DIRECT_PAC_CONTENT;
use pac_relay::constants::INVALID_SECRET_MSG;
use pac_relay::constants::MISSING_SECRET_MSG;
use pac_relay::constants::PAC_CONTENT_TYPE;
use pac_relay::constants::SECRET_HEADER;
use pac_relay::ConfigId;
use pac_relay::ConfigRegistry;
use tokio::time;
use warp::http::StatusCode;
use warp::test::WsClient;

use crate::commons::test_registry;
use crate::commons::wait_until_active;
use crate::commons::wait_until_removed;
use crate::commons::FRAME_TIMEOUT;
use crate::commons::MAX_UPLOAD_BYTES;
use crate::commons::QUIET_PERIOD;

const SECRET: &str = "abc";
const SECRET_ID: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";

async fn upload(
    registry: &Arc<ConfigRegistry>,
    secret: &str,
    content: &str,
) -> (StatusCode, String) {
    let res = warp::test::request()
        .method("POST")
        .path("/upload")
        .header(SECRET_HEADER, secret)
        .body(content.to_string())
        .reply(&api_routes(registry.clone(), MAX_UPLOAD_BYTES))
        .await;
    (res.status(), String::from_utf8_lossy(res.body()).to_string())
}

async fn fetch(
    registry: &Arc<ConfigRegistry>,
    id: &str,
    from: SocketAddr,
) -> (StatusCode, String) {
    let res = warp::test::request()
        .method("GET")
        .path(&format!("/pac/{}", id))
        .remote_addr(from)
        .header("user-agent", "integration-agent")
        .reply(&api_routes(registry.clone(), MAX_UPLOAD_BYTES))
        .await;
    (res.status(), String::from_utf8_lossy(res.body()).to_string())
}

async fn connect(
    registry: &Arc<ConfigRegistry>,
    secret: Option<&str>,
) -> WsClient {
    let mut builder = warp::test::ws().path("/ws");
    if let Some(secret) = secret {
        builder = builder.header(SECRET_HEADER, secret);
    }
    builder
        .handshake(api_routes(registry.clone(), MAX_UPLOAD_BYTES))
        .await
        .expect("handshake")
}

async fn next_text(client: &mut WsClient) -> String {
    let msg = time::timeout(FRAME_TIMEOUT, client.recv())
        .await
        .expect("frame within timeout")
        .expect("frame");
    msg.to_str().expect("text frame").to_string()
}

/// Server must close after a rejection; either a close frame or a closed
/// channel counts.
async fn expect_closed(client: &mut WsClient) {
    let next = time::timeout(FRAME_TIMEOUT, client.recv())
        .await
        .expect("close within timeout");
    if let Ok(msg) = next {
        assert!(msg.is_close(), "expected close, got {:?}", msg);
    }
}

async fn expect_no_frame(client: &mut WsClient) {
    if let Ok(frame) = time::timeout(QUIET_PERIOD, client.recv()).await {
        panic!("unexpected frame: {:?}", frame);
    }
}

fn peer() -> SocketAddr {
    SocketAddr::from(([192, 168, 1, 50], 40000))
}

#[tokio::test]
async fn test_upload_then_fetch_returns_content() {
    let registry = test_registry();

    let (status, id) = upload(&registry, SECRET, "X").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id, SECRET_ID);

    let res = warp::test::request()
        .path(&format!("/pac/{}", id))
        .reply(&api_routes(registry.clone(), MAX_UPLOAD_BYTES))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], PAC_CONTENT_TYPE);
    assert_eq!(res.body().as_ref(), b"X");
}

#[tokio::test]
async fn test_fetch_notifies_attached_listener_once() {
    let registry = test_registry();
    upload(&registry, SECRET, "X").await;

    let mut client = connect(&registry, Some(SECRET)).await;
    let id = ConfigId::from(SECRET_ID);
    wait_until_active(&registry, &id).await;

    let (status, body) = fetch(&registry, SECRET_ID, peer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "X");

    let text = next_text(&mut client).await;
    assert!(text.starts_with("Config accessed by 192.168.1.50"), "{}", text);
    assert!(text.contains("integration-agent"));
    expect_no_frame(&mut client).await;
}

#[tokio::test]
async fn test_real_ip_header_is_reported() {
    let registry = test_registry();
    upload(&registry, SECRET, "X").await;
    let mut client = connect(&registry, Some(SECRET)).await;
    wait_until_active(&registry, &ConfigId::from(SECRET_ID)).await;

    warp::test::request()
        .path(&format!("/pac/{}", SECRET_ID))
        .remote_addr(peer())
        .header("x-real-ip", "203.0.113.9")
        .reply(&api_routes(registry.clone(), MAX_UPLOAD_BYTES))
        .await;

    let text = next_text(&mut client).await;
    assert!(text.starts_with("Config accessed by 203.0.113.9"), "{}", text);
}

#[tokio::test]
async fn test_fetch_of_other_id_sends_nothing() {
    let registry = test_registry();
    upload(&registry, SECRET, "X").await;
    let (_, other_id) = upload(&registry, "other-secret", "Y").await;

    let mut client = connect(&registry, Some(SECRET)).await;
    wait_until_active(&registry, &ConfigId::from(SECRET_ID)).await;

    let (status, body) = fetch(&registry, &other_id, peer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Y");

    expect_no_frame(&mut client).await;
}

#[tokio::test]
async fn test_disconnect_removes_config() {
    let registry = test_registry();
    upload(&registry, SECRET, "X").await;
    let client = connect(&registry, Some(SECRET)).await;
    let id = ConfigId::from(SECRET_ID);
    wait_until_active(&registry, &id).await;
    assert_eq!(registry.active_count(), 1);

    drop(client);
    wait_until_removed(&registry, &id).await;
    assert_eq!(registry.active_count(), 0);

    let (_, body) = fetch(&registry, SECRET_ID, peer()).await;
    assert_eq!(body, DIRECT_PAC_CONTENT);

    let (status, _) = upload(&registry, SECRET, "Z").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_secret_is_rejected() {
    let registry = test_registry();

    let mut client = connect(&registry, Some("never-uploaded")).await;
    assert_eq!(next_text(&mut client).await, INVALID_SECRET_MSG);
    expect_closed(&mut client).await;

    assert!(registry.get(&ConfigId::derive("never-uploaded")).is_none());
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_missing_secret_is_rejected() {
    let registry = test_registry();

    let mut client = connect(&registry, None).await;
    assert_eq!(next_text(&mut client).await, MISSING_SECRET_MSG);
    expect_closed(&mut client).await;
}

#[tokio::test]
async fn test_reupload_while_listening_conflicts() {
    let registry = test_registry();
    upload(&registry, SECRET, "X").await;
    let _client = connect(&registry, Some(SECRET)).await;
    wait_until_active(&registry, &ConfigId::from(SECRET_ID)).await;

    let (status, body) = upload(&registry, SECRET, "changed").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, "Active config for the same secret already exists");

    let (_, served) = fetch(&registry, SECRET_ID, peer()).await;
    assert_eq!(served, "X");
}

#[tokio::test]
async fn test_second_listener_is_rejected_and_first_keeps_working() {
    let registry = test_registry();
    upload(&registry, SECRET, "X").await;
    let mut first = connect(&registry, Some(SECRET)).await;
    let id = ConfigId::from(SECRET_ID);
    wait_until_active(&registry, &id).await;

    let mut second = connect(&registry, Some(SECRET)).await;
    assert_eq!(next_text(&mut second).await, ALREADY_ATTACHED_MSG);
    expect_closed(&mut second).await;

    assert!(registry.is_active(&id));
    fetch(&registry, SECRET_ID, peer()).await;
    let text = next_text(&mut first).await;
    assert!(text.starts_with("Config accessed by"), "{}", text);
}
