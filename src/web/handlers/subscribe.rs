//! Newsletter subscribe and unsubscribe handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::subscriber::{SubscribeOutcome, SubscriberRepository};
use crate::web::dto::{
    ApiResponse, MessageResponse, SubscribeRequest, UnsubscribeQuery, UnsubscribeResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;

/// POST /api/subscribe - Subscribe an email address.
///
/// 201 for a new address, 200 when an address is reactivated or already
/// subscribed.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    if !state.captcha.verify(req.captcha_token.trim()).await? {
        return Err(ApiError::bad_request("Captcha verification failed"));
    }

    let (subscriber, outcome) = SubscriberRepository::new(state.db.pool())
        .subscribe(&req.email)
        .await?;
    tracing::info!(subscriber_id = %subscriber.id, outcome = ?outcome, "Subscribe request");

    let status = match outcome {
        SubscribeOutcome::Created => StatusCode::CREATED,
        SubscribeOutcome::Reactivated | SubscribeOutcome::AlreadyActive => StatusCode::OK,
    };
    Ok((
        status,
        Json(ApiResponse::new(MessageResponse::new(outcome.message()))),
    ))
}

/// GET /api/unsubscribe?id= - Unsubscribe by subscriber ID.
///
/// Repeating the request for an already unsubscribed ID succeeds again.
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UnsubscribeQuery>,
) -> Result<Json<ApiResponse<UnsubscribeResponse>>, ApiError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Subscriber id is required"))?;
    let id = Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid subscriber id"))?;

    let subscriber = SubscriberRepository::new(state.db.pool())
        .unsubscribe(&id.to_string())
        .await?
        .ok_or_else(|| ApiError::not_found("Subscriber not found"))?;
    tracing::info!(subscriber_id = %subscriber.id, "Unsubscribed");

    Ok(Json(ApiResponse::new(UnsubscribeResponse {
        message: "Successfully unsubscribed".to_string(),
        email: subscriber.email,
    })))
}
