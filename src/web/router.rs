//! Router configuration for the web API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_audio_url, get_episode, latest_episode, list_episodes, serve_media, subscribe,
    unsubscribe, AppState,
};
use super::middleware::{create_cors_layer, security_headers};

/// Create the main router: the JSON API under `/api`, signed media under
/// `/media` and `/health`.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/episodes", get(list_episodes))
        .route("/episodes/latest", get(latest_episode))
        .route("/episodes/:id", get(get_episode))
        .route("/audio/:key", get(get_audio_url))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", get(unsubscribe));

    Router::new()
        .nest("/api", api_routes)
        .route("/media/:key", get(serve_media))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
