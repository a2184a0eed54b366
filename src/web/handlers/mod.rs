//! API handlers for the HNTLDR web API.

pub mod audio;
pub mod episodes;
pub mod subscribe;

pub use audio::*;
pub use episodes::*;
pub use subscribe::*;

use std::sync::Arc;

use crate::cache::{LatestEpisodeCache, DEFAULT_LATEST_EPISODE_TTL_SECS};
use crate::clock::Clock;
use crate::storage::AudioStorage;
use crate::subscriber::{CaptchaVerifier, DisabledCaptcha};
use crate::Database;

/// Shared state for all handlers.
pub struct AppState {
    pub db: Arc<Database>,
    pub storage: AudioStorage,
    pub cache: LatestEpisodeCache,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub clock: Arc<dyn Clock>,
    /// Externally visible base URL for signed media links.
    pub public_base_url: String,
}

impl AppState {
    /// Create handler state. Captcha checks are off until
    /// [`AppState::with_captcha`] is called.
    pub fn new(
        db: Arc<Database>,
        storage: AudioStorage,
        clock: Arc<dyn Clock>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            storage,
            cache: LatestEpisodeCache::new(clock.clone(), DEFAULT_LATEST_EPISODE_TTL_SECS),
            captcha: Arc::new(DisabledCaptcha),
            clock,
            public_base_url: public_base_url.into(),
        }
    }

    /// Use a captcha verifier for subscribe requests.
    pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = captcha;
        self
    }

    /// Change how long the latest episode is cached.
    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache = LatestEpisodeCache::new(self.clock.clone(), ttl_secs);
        self
    }
}
