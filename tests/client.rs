//! Kiosk client tests against a stub HTTP endpoint

use std::collections::BTreeMap;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kiosk_gateway::{CommandInvoker, CommandOutcome, KioskClient, KioskCommand};

/// Build a client pointed at the mock server's port, plus the address to call
fn client_for(server: &MockServer) -> (KioskClient, String) {
    let addr = server.address();
    let client =
        KioskClient::with_port("hunter2".to_string(), addr.port()).expect("client should build");
    (client, addr.ip().to_string())
}

#[tokio::test]
async fn successful_response_carries_full_decoded_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("password", "hunter2"))
        .and(query_param("type", "json"))
        .and(query_param("cmd", "getDeviceInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "volume": 50,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, address) = client_for(&server);
    let outcome = client
        .invoke(KioskCommand::GetDeviceInfo, &address, &BTreeMap::new())
        .await;

    match outcome {
        CommandOutcome::Success(object) => {
            assert_eq!(object["status"], "OK");
            assert_eq!(object["volume"], 50);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn device_error_status_resolves_to_device_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Error",
            "statustext": "busy",
        })))
        .mount(&server)
        .await;

    let (client, address) = client_for(&server);
    let outcome = client
        .invoke(KioskCommand::ScreenOn, &address, &BTreeMap::new())
        .await;

    match outcome {
        CommandOutcome::Device(message) => assert_eq!(message, "busy"),
        other => panic!("expected device failure, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_resolves_to_malformed_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let (client, address) = client_for(&server);
    let outcome = client
        .invoke(KioskCommand::RefreshTab, &address, &BTreeMap::new())
        .await;

    assert!(matches!(outcome, CommandOutcome::Malformed(_)));
}

#[tokio::test]
async fn extra_params_are_appended_to_the_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("cmd", "loadUrl"))
        .and(query_param("url", "https://example.com/board?x=1"))
        .and(query_param("focus", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut params: BTreeMap<String, Value> = BTreeMap::new();
    params.insert("url".to_string(), json!("https://example.com/board?x=1"));
    params.insert("focus".to_string(), json!(true));

    let (client, address) = client_for(&server);
    let outcome = client.invoke(KioskCommand::LoadUrl, &address, &params).await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn unreachable_device_resolves_to_transport_failure() {
    // Grab a port with no listener behind it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let client = KioskClient::with_port("hunter2".to_string(), port).expect("client should build");
    let outcome = client
        .invoke(KioskCommand::ScreenOff, "127.0.0.1", &BTreeMap::new())
        .await;

    assert!(matches!(outcome, CommandOutcome::Transport(_)));
}
