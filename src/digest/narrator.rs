//! Narration synthesis (text-to-speech).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::NarrationConfig;
use crate::{HntldrError, Result};

/// Connection timeout for synthesis requests.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Turns a narration script into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    speed: f32,
    stability: f32,
    similarity_boost: f32,
    style: f32,
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    settings: VoiceSettings,
}

impl ElevenLabsClient {
    /// Create a client from configuration.
    pub fn new(config: &NarrationConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HntldrError::Generation(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            settings: VoiceSettings {
                speed: config.speed,
                stability: config.stability,
                similarity_boost: config.similarity_boost,
                style: config.style,
            },
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url,
            urlencoding::encode(&self.voice_id)
        );
        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: self.settings,
        };

        debug!(chars = text.len(), "Requesting speech synthesis");
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| HntldrError::Generation(format!("speech request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(HntldrError::Generation(format!(
                "speech API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| HntldrError::Generation(format!("failed to read audio: {}", e)))?;

        if audio.is_empty() {
            return Err(HntldrError::Generation("speech API returned no audio".to_string()));
        }

        info!("Synthesized {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_shape() {
        let body = SpeechRequest {
            text: "Hello",
            model_id: "eleven_turbo_v2",
            voice_settings: VoiceSettings {
                speed: 1.0,
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.45,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["model_id"], "eleven_turbo_v2");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
    }
}
