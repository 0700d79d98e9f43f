use std::net::IpAddr;
use std::net::Ipv4Addr;

use pac_relay::build_pac;
use pac_relay::constants::INVALID_SECRET_MSG;
use pac_relay::ClientError;
use pac_relay::ConfigId;
use pac_relay::Error;
use pac_relay::PacClient;
use tokio::sync::mpsc;
use tokio::time;

use crate::commons::spawn_server;
use crate::commons::test_registry;
use crate::commons::wait_until_active;
use crate::commons::wait_until_removed;
use crate::commons::FRAME_TIMEOUT;

#[tokio::test]
async fn test_client_upload_listen_and_receive_access() {
    let registry = test_registry();
    let addr = spawn_server(registry.clone());
    let client = PacClient::new(&format!("http://{}", addr)).unwrap();

    let pac = build_pac(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)), &[8888, 8080]);
    let id = client.upload(&pac, "client-secret").await.unwrap();
    assert_eq!(id, ConfigId::derive("client-secret"));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = tokio::spawn(async move {
        let client = PacClient::new(&format!("http://{}", addr)).unwrap();
        client
            .listen("client-secret", |text| {
                let _ = tx.send(text.to_string());
            })
            .await
    });
    wait_until_active(&registry, &id).await;

    let body = reqwest::Client::new()
        .get(client.pac_url(&id))
        .header("user-agent", "browser/1.0")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, pac);

    let text = time::timeout(FRAME_TIMEOUT, rx.recv())
        .await
        .expect("notification within timeout")
        .expect("listener alive");
    assert!(text.starts_with("Config accessed by 127.0.0.1"), "{}", text);
    assert!(text.ends_with("browser/1.0"), "{}", text);

    listener.abort();
    wait_until_removed(&registry, &id).await;
}

#[tokio::test]
async fn test_client_upload_conflict_while_listening() {
    let registry = test_registry();
    let addr = spawn_server(registry.clone());
    let client = PacClient::new(&format!("http://{}", addr)).unwrap();

    let id = client.upload("first", "busy-secret").await.unwrap();
    let listener = tokio::spawn(async move {
        let client = PacClient::new(&format!("http://{}", addr)).unwrap();
        client.listen("busy-secret", |_| {}).await
    });
    wait_until_active(&registry, &id).await;

    match client.upload("second", "busy-secret").await {
        Err(Error::Client(ClientError::Upload { status, body })) => {
            assert_eq!(status, 409);
            assert_eq!(body, "Active config for the same secret already exists");
        }
        other => panic!("expected upload conflict, got {:?}", other),
    }

    listener.abort();
}

#[tokio::test]
async fn test_client_listen_without_upload_ends_after_rejection() {
    let registry = test_registry();
    let addr = spawn_server(registry.clone());
    let client = PacClient::new(&format!("http://{}", addr)).unwrap();

    let mut messages = Vec::new();
    let result = time::timeout(
        FRAME_TIMEOUT,
        client.listen("nobody", |text| messages.push(text.to_string())),
    )
    .await
    .expect("listen returns after rejection");

    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(messages, vec![INVALID_SECRET_MSG.to_string()]);
    assert_eq!(registry.active_count(), 0);
}
