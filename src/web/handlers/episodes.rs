//! Episode reader handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::episode::{Episode, EpisodeRepository, EpisodeWithSources};
use crate::web::dto::ApiResponse;
use crate::web::error::ApiError;

/// GET /api/episodes - List all episodes, newest first.
pub async fn list_episodes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Episode>>>, ApiError> {
    let episodes = EpisodeRepository::new(state.db.pool()).list().await?;
    Ok(Json(ApiResponse::new(episodes)))
}

/// GET /api/episodes/latest - Latest episode with its sources.
pub async fn latest_episode(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EpisodeWithSources>>, ApiError> {
    let db = state.db.clone();
    let latest = state
        .cache
        .get_or_load(|| async move { EpisodeRepository::new(db.pool()).latest_with_sources().await })
        .await?;

    latest
        .map(|episode| Json(ApiResponse::new(episode)))
        .ok_or_else(|| ApiError::not_found("No episodes available"))
}

/// GET /api/episodes/:id - Episode with its sources.
pub async fn get_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EpisodeWithSources>>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid episode id"))?;

    EpisodeRepository::new(state.db.pool())
        .get_with_sources(&id.to_string())
        .await?
        .map(|episode| Json(ApiResponse::new(episode)))
        .ok_or_else(|| ApiError::not_found("Episode not found"))
}
