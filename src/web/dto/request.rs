//! Request DTOs for the web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{has_domain_dot, not_empty_trimmed};

/// Newsletter subscribe request.
///
/// Missing fields deserialize as empty strings so they are reported by
/// validation rather than as malformed JSON.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 254, message = "Email is required"),
        email(message = "Invalid email address"),
        custom(function = "has_domain_dot", message = "Invalid email address")
    )]
    pub email: String,
    /// Turnstile token from the browser widget.
    #[serde(default)]
    #[validate(custom(function = "not_empty_trimmed", message = "Captcha token is required"))]
    pub captcha_token: String,
}

/// Unsubscribe query string.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    /// Subscriber ID from the newsletter link.
    pub id: Option<String>,
}

/// Signed media query string.
#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    /// Expiry as a unix timestamp.
    pub expires: Option<i64>,
    pub signature: Option<String>,
}
