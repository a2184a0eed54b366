//! Latest-episode cache.
//!
//! The latest episode changes at most a few times a day, so the web server
//! keeps it in memory for a short TTL instead of hitting the database on every
//! page load. Only found values are cached; "no episode yet" is re-checked on
//! every request.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::episode::EpisodeWithSources;
use crate::Result;

/// Default time a loaded episode is served from memory.
pub const DEFAULT_LATEST_EPISODE_TTL_SECS: u64 = 300;

struct Entry<T> {
    value: T,
    loaded_at: DateTime<Utc>,
}

/// TTL cache for a single value, read through a loader.
pub struct LatestEpisodeCache<T = EpisodeWithSources> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> LatestEpisodeCache<T> {
    /// Create an empty cache.
    pub fn new(clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            clock,
            ttl: Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64),
            entry: Mutex::new(None),
        }
    }

    /// Return the cached value while fresh, otherwise call `loader`.
    ///
    /// Concurrent callers wait for a single load.
    pub async fn get_or_load<F, Fut>(&self, loader: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut entry = self.entry.lock().await;
        let now = self.clock.now();

        if let Some(cached) = entry.as_ref() {
            if now - cached.loaded_at < self.ttl {
                return Ok(Some(cached.value.clone()));
            }
        }

        debug!("Latest episode cache miss");
        let loaded = loader().await?;
        *entry = loaded.as_ref().map(|value| Entry {
            value: value.clone(),
            loaded_at: now,
        });
        Ok(loaded)
    }

    /// Drop the cached value.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}
