//! Router tests driven in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use profile_api::{build_router, AppState};
use profile_resolver::testing::{FailingCache, MockProvider, UnreachableProvider};
use profile_resolver::{
    InMemoryCache, ProfileCache, ProfileProvider, ProviderError, Resolver, ResolverConfig,
};

fn app(cache: Arc<dyn ProfileCache>, provider: Arc<dyn ProfileProvider>) -> Router {
    let resolver = Resolver::new(cache.clone(), provider, ResolverConfig::default());
    build_router(AppState { resolver, cache })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_describes_service() {
    let app = app(Arc::new(InMemoryCache::default()), Arc::new(UnreachableProvider::new()));
    let (status, body) = send(app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "LinkedIn Profile Scraper API");
    assert!(body["endpoints"].is_object());
}

#[tokio::test]
async fn health_reports_cache_state() {
    let healthy = app(Arc::new(InMemoryCache::default()), Arc::new(UnreachableProvider::new()));
    let (status, body) = send(healthy, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cacheConnection"], "ok");

    let broken = app(Arc::new(FailingCache), Arc::new(UnreachableProvider::new()));
    let (status, body) = send(broken, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["cacheConnection"], "failed");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn scrape_by_handle_returns_envelope() {
    let provider = Arc::new(MockProvider::returning(json!({
        "id": "alice",
        "name": "Alice",
        "activity": [
            {"id": "1", "interaction": "Liked by Alice", "link": "l1", "title": "t1"}
        ]
    })));
    let app = app(Arc::new(InMemoryCache::default()), provider.clone());

    let (status, body) = send(app, get("/scrape/alice?user_id=u1")).await;
    assert_eq!(status, StatusCode::OK);

    let mut fields: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    fields.sort();
    assert_eq!(
        fields,
        vec!["cached", "error", "formatted_output", "profile_data", "success"]
    );
    assert_eq!(body["success"], true);
    assert_eq!(body["cached"], false);
    assert!(body["error"].is_null());
    assert_eq!(body["profile_data"]["name"], "Alice");
    assert_eq!(
        body["profile_data"]["activitySummary"],
        "User has 1 recent activities: 1 liked."
    );
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn post_scrape_resolves_url() {
    let cache = Arc::new(InMemoryCache::default());
    let provider = Arc::new(MockProvider::returning(json!({"id": "bob", "name": "Bob"})));
    let app = app(cache, provider);

    let (status, body) = send(
        app.clone(),
        post_json("/scrape", json!({"url": "https://www.linkedin.com/in/bob/"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["profile_data"]["id"], "bob");

    let (_, body) = send(app, get("/scrape/bob")).await;
    assert_eq!(body["cached"], true);
}

#[tokio::test]
async fn failures_are_reported_in_body() {
    let provider = Arc::new(MockProvider::failing(ProviderError::RateLimited(
        "429".into(),
    )));
    let app = app(Arc::new(InMemoryCache::default()), provider);

    let (status, body) = send(app, get("/scrape/alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["cached"], false);
    assert!(body["profile_data"].is_null());
    assert!(body["formatted_output"].is_null());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn invalid_url_never_reaches_provider() {
    let provider = Arc::new(UnreachableProvider::new());
    let app = app(Arc::new(InMemoryCache::default()), provider.clone());

    let (status, body) = send(
        app,
        post_json("/scrape", json!({"url": "not-a-linkedin-url", "user_id": "u1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid identifier"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = app(Arc::new(InMemoryCache::default()), Arc::new(UnreachableProvider::new()));
    let (status, _) = send(app, post_json("/scrape", json!({"user_id": "u1"}))).await;
    assert!(status.is_client_error());
}
