use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use profile_resolver::ResponseEnvelope;

use crate::AppState;

const DEFAULT_USER_ID: &str = "api_user";

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/scrape", post(scrape))
        .route("/scrape/{handle}", get(scrape_by_handle))
        .with_state(state)
        .layer(cors)
        // method + path only; query strings carry user ids
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "LinkedIn Profile Scraper API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scrape": "/scrape - POST a profile URL to get profile data",
            "scrape_by_handle": "/scrape/{handle} - GET profile data by handle",
            "health": "/health - Health check"
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.cache.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "cacheConnection": "ok",
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            tracing::warn!(cache = state.cache.name(), error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "cacheConnection": "failed",
                    "error": e.to_string(),
                    "timestamp": timestamp,
                })),
            )
        }
    }
}

async fn scrape(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Json<ResponseEnvelope> {
    let user_id = req.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);
    Json(state.resolver.respond(&req.url, user_id).await)
}

async fn scrape_by_handle(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<ScrapeQuery>,
) -> Json<ResponseEnvelope> {
    let user_id = query.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);
    Json(state.resolver.respond(&handle, user_id).await)
}
