//! Captcha verification for subscribe requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CaptchaConfig;
use crate::{HntldrError, Result};

/// Timeout for a verification request.
const VERIFY_TIMEOUT_SECS: u64 = 10;

/// Checks a captcha token submitted by the browser.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Returns `Ok(false)` when the provider rejects the token.
    async fn verify(&self, token: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile site verification.
pub struct TurnstileVerifier {
    client: Client,
    verify_url: String,
    secret: String,
}

impl TurnstileVerifier {
    /// Create a verifier from configuration.
    pub fn new(config: &CaptchaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(VERIFY_TIMEOUT_SECS))
            .build()
            .map_err(|e| HntldrError::Upstream(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
        })
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str) -> Result<bool> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| HntldrError::Upstream(format!("captcha verification failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HntldrError::Upstream(format!(
                "captcha verification HTTP error: {}",
                response.status()
            )));
        }

        let outcome: VerifyResponse = response
            .json()
            .await
            .map_err(|e| HntldrError::Upstream(format!("malformed captcha response: {}", e)))?;

        if outcome.success {
            debug!("Captcha token accepted");
        } else {
            warn!("Captcha token rejected: {:?}", outcome.error_codes);
        }
        Ok(outcome.success)
    }
}

/// Accepts every token. Used when captcha is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    async fn verify(&self, _token: &str) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_captcha_accepts_anything() {
        assert!(DisabledCaptcha.verify("").await.unwrap());
        assert!(DisabledCaptcha.verify("garbage").await.unwrap());
    }

    #[test]
    fn test_verify_response_parses_error_codes() {
        let parsed: VerifyResponse =
            serde_json::from_str(r#"{"success": false, "error-codes": ["invalid-input-response"]}"#)
                .unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_codes, vec!["invalid-input-response"]);
    }
}
