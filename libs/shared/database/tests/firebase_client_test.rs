use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{FirebaseClient, RealtimeStore, StoreError};

fn client_for(server: &MockServer, auth_token: &str) -> FirebaseClient {
    let config = AppConfig {
        firebase_database_url: server.uri(),
        firebase_auth_token: auth_token.to_string(),
        ..AppConfig::default()
    };
    FirebaseClient::new(&config)
}

#[tokio::test]
async fn test_read_existing_and_missing_nodes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/doc1/b1.json"))
        .and(query_param("auth", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bookings/doc1/missing.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "secret");
    assert_eq!(
        client.read("bookings/doc1/b1").await.unwrap(),
        Some(json!({"status": "pending"}))
    );
    assert_eq!(client.read("bookings/doc1/missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_update_sends_single_patch() {
    let mock_server = MockServer::start().await;
    let fields = json!({"status": "rejected", "rejectedAt": "2024-01-02T09:00:00Z"});

    Mock::given(method("PATCH"))
        .and(path("/bookings/doc1/b1.json"))
        .and(header("content-type", "application/json"))
        .and(body_json(fields.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(fields.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "");
    client
        .update("bookings/doc1/b1", fields.as_object().cloned().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_push_returns_generated_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings/doc1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-NxYz123"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "");
    let id = client.push("bookings/doc1", json!({"status": "pending"})).await.unwrap();
    assert_eq!(id, "-NxYz123");
}

#[tokio::test]
async fn test_permission_denied_is_mapped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/bookings/doc1/b1.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "");
    let result = client.remove("bookings/doc1/b1").await;
    assert_matches!(result, Err(StoreError::PermissionDenied(message)) if message == "Permission denied");
}

#[tokio::test]
async fn test_server_error_is_mapped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/doctors/doc1.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "");
    let result = client.write("doctors/doc1", json!({"name": "A"})).await;
    assert_matches!(result, Err(StoreError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_subscribe_replays_stream_events() {
    let mock_server = MockServer::start().await;
    let body = concat!(
        "event: put\n",
        "data: {\"path\":\"/\",\"data\":{\"b1\":{\"status\":\"pending\"}}}\n\n",
        "event: keep-alive\n",
        "data: null\n\n",
        "event: patch\n",
        "data: {\"path\":\"/b1\",\"data\":{\"status\":\"accepted\",\"serialNumber\":1}}\n\n",
        "event: put\n",
        "data: {\"path\":\"/b2\",\"data\":{\"status\":\"pending\"}}\n\n",
    );

    Mock::given(method("GET"))
        .and(path("/bookings/doc1.json"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "");
    let mut subscription = client.subscribe("bookings/doc1").await.unwrap();

    let mut snapshots = Vec::new();
    while let Ok(Some(next)) = timeout(Duration::from_secs(1), subscription.recv()).await {
        snapshots.push(next.unwrap());
    }

    assert_eq!(
        snapshots,
        vec![
            Some(json!({"b1": {"status": "pending"}})),
            Some(json!({"b1": {"status": "accepted", "serialNumber": 1}})),
            Some(json!({
                "b1": {"status": "accepted", "serialNumber": 1},
                "b2": {"status": "pending"}
            })),
        ]
    );
}
