//! Response DTOs for the web API.

use serde::Serialize;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Time-limited link to an audio object.
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub url: String,
}

/// Plain message for the user.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of an unsubscribe request.
#[derive(Debug, Serialize)]
pub struct UnsubscribeResponse {
    pub message: String,
    /// Address that was unsubscribed.
    pub email: String,
}
