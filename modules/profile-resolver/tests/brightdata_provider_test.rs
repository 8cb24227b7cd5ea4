//! BrightDataProvider against a mocked dataset API.

use std::time::Duration;

use brightdata_client::BrightDataClient;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use profile_common::ProfileKey;
use profile_resolver::{BrightDataProvider, ProfileProvider, ProviderError};

fn provider(server: &MockServer) -> BrightDataProvider {
    let client = BrightDataClient::new("token".into(), "gd_test".into())
        .with_base_url(&server.uri())
        .with_polling(Duration::ZERO, 2);
    BrightDataProvider::new(client)
}

async fn mount_trigger(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .and(body_json(json!([{"url": "https://www.linkedin.com/in/alice/"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s1"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_returns_first_record() {
    let server = MockServer::start().await;
    mount_trigger(&server).await;
    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "alice", "name": "Alice", "city": "Berlin"}
        ])))
        .mount(&server)
        .await;

    let key = ProfileKey::parse("Alice").unwrap();
    let payload = provider(&server).fetch(&key).await.unwrap();
    assert_eq!(payload.as_map().get("name"), Some(&json!("Alice")));
}

#[tokio::test]
async fn dead_page_is_not_found() {
    let server = MockServer::start().await;
    mount_trigger(&server).await;
    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"url": "https://www.linkedin.com/in/alice/", "error": "Page does not exist", "error_code": "dead_page"}
        ])))
        .mount(&server)
        .await;

    let key = ProfileKey::parse("alice").unwrap();
    let err = provider(&server).fetch(&key).await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn throttled_trigger_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(429).set_body_string("too many requests"))
        .expect(1)
        .mount(&server)
        .await;

    let key = ProfileKey::parse("alice").unwrap();
    let err = provider(&server).fetch(&key).await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited(_)));
}

#[tokio::test]
async fn unfinished_snapshot_is_transient() {
    let server = MockServer::start().await;
    mount_trigger(&server).await;
    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/s1"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "running"})))
        .mount(&server)
        .await;

    let key = ProfileKey::parse("alice").unwrap();
    let err = provider(&server).fetch(&key).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transient(_)));
}
