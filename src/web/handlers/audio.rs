//! Audio handlers: signed links and signed media delivery.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::storage::AudioStorage;
use crate::web::dto::{ApiResponse, MediaQuery, SignedUrlResponse};
use crate::web::error::ApiError;

/// GET /api/audio/:key - Time-limited URL for an audio object.
pub async fn get_audio_url(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    AudioStorage::validate_key(&key)?;

    if !state.storage.exists(&key).await? {
        return Err(ApiError::not_found("Audio not found"));
    }

    let url = state
        .storage
        .signed_url(&state.public_base_url, &key, state.clock.now())?;
    tracing::debug!(key = %key, "Issued signed audio URL");

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(ApiResponse::new(SignedUrlResponse { url })),
    )
        .into_response())
}

/// GET /media/:key?expires=&signature= - Audio bytes behind a signed URL.
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<MediaQuery>,
) -> Result<Response, ApiError> {
    let authorized = match (query.expires, query.signature.as_deref()) {
        (Some(expires), Some(signature)) => {
            state
                .storage
                .verify(&key, expires, signature, state.clock.now())
        }
        _ => false,
    };
    if !authorized {
        return Err(ApiError::forbidden("Invalid or expired signature"));
    }

    let content = state.storage.load(&key).await?;
    let mime = mime_guess::from_path(&key).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "private".to_string()),
        ],
        content,
    )
        .into_response())
}
