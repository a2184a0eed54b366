//! Hacker News story source.
//!
//! Fetches the front-page story IDs and per-story details from the public
//! Firebase API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::HackerNewsConfig;
use crate::{HntldrError, Result};

/// Base URL of HN discussion pages.
pub const DISCUSSION_BASE_URL: &str = "https://news.ycombinator.com/item?id=";

/// User agent string for API requests.
const USER_AGENT: &str = "hntldr/0.1 (ranking recorder)";

/// A story as returned by the item endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryItem {
    pub id: i64,
    #[serde(default)]
    pub score: i64,
    /// Unix seconds.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    /// Comment count.
    #[serde(default)]
    pub descendants: i64,
}

impl StoryItem {
    /// Submission time, or the epoch when the API omits it.
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.time, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Link to the HN discussion page.
    pub fn discussion_url(&self) -> String {
        format!("{}{}", DISCUSSION_BASE_URL, self.id)
    }

    /// External link, falling back to the discussion page for Ask/Show posts.
    pub fn link(&self) -> String {
        match self.url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => self.discussion_url(),
        }
    }

    /// Title, or a stand-in when the API has none.
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => format!("HN story {}", self.id),
        }
    }
}

/// Source of front-page stories.
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Current front-page story IDs, in rank order.
    async fn top_story_ids(&self) -> Result<Vec<i64>>;

    /// Details for one story.
    async fn story(&self, id: i64) -> Result<StoryItem>;
}

/// HTTP client for the HN Firebase API.
pub struct HackerNewsClient {
    client: Client,
    base_url: String,
}

impl HackerNewsClient {
    /// Create a client from configuration.
    pub fn new(config: &HackerNewsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HntldrError::Upstream(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HntldrError::Upstream(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(HntldrError::Upstream(format!(
                "HTTP error from {}: {}",
                url,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| HntldrError::Upstream(format!("malformed response from {}: {}", url, e)))
    }
}

#[async_trait]
impl StorySource for HackerNewsClient {
    async fn top_story_ids(&self) -> Result<Vec<i64>> {
        let url = format!("{}/v0/topstories.json", self.base_url);
        self.get_json(&url).await
    }

    async fn story(&self, id: i64) -> Result<StoryItem> {
        let url = format!("{}/v0/item/{}.json", self.base_url, id);
        // Deleted or unknown items come back as a literal `null`.
        let item: Option<StoryItem> = self.get_json(&url).await?;
        item.ok_or_else(|| HntldrError::Upstream(format!("story {} returned null", id)))
    }
}
