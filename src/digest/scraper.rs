//! Linked article scraping.
//!
//! Scraping is best effort: any failure becomes a short placeholder so a
//! digest run never fails because one site is down.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{HntldrError, Result};

/// Browser-like user agent; many sites refuse obvious bots.
const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Column width passed to the HTML renderer. Lines are joined afterwards.
const RENDER_WIDTH: usize = 200;

/// Placeholder for HN discussion links.
pub const DISCUSSION_PLACEHOLDER: &str = "HN discussion link - no external content";

/// Placeholder when the page could not be fetched.
pub const UNAVAILABLE_PLACEHOLDER: &str = "Content unavailable";

/// Placeholder when the page could not be turned into text.
pub const EXTRACTION_FAILED_PLACEHOLDER: &str = "Error extracting content";

/// Fetches linked pages and reduces them to plain text.
pub struct ContentScraper {
    client: Client,
    max_chars: usize,
}

impl ContentScraper {
    /// Create a scraper with a total request timeout and text cap.
    pub fn new(timeout_secs: u64, max_chars: usize) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HntldrError::Upstream(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, max_chars })
    }

    /// Plain text of the page at `url`, or a placeholder.
    pub async fn scrape(&self, url: &str) -> String {
        if is_discussion_link(url) {
            return DISCUSSION_PLACEHOLDER.to_string();
        }

        debug!("Scraping {}", url);
        let response = match self
            .client
            .get(url)
            .header(USER_AGENT, USER_AGENT_STRING)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                return UNAVAILABLE_PLACEHOLDER.to_string();
            }
        };

        if !response.status().is_success() {
            warn!("Failed to fetch {}: {}", url, response.status());
            return UNAVAILABLE_PLACEHOLDER.to_string();
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to read {}: {}", url, e);
                return EXTRACTION_FAILED_PLACEHOLDER.to_string();
            }
        };

        match html2text::from_read(html.as_bytes(), RENDER_WIDTH) {
            Ok(text) => {
                let cleaned = clean_text(&text, self.max_chars);
                if cleaned.is_empty() {
                    UNAVAILABLE_PLACEHOLDER.to_string()
                } else {
                    cleaned
                }
            }
            Err(e) => {
                warn!("Failed to convert {} to text: {}", url, e);
                EXTRACTION_FAILED_PLACEHOLDER.to_string()
            }
        }
    }
}

/// Whether the URL points at Hacker News itself.
pub fn is_discussion_link(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .is_some_and(|host| host == "news.ycombinator.com"),
        Err(_) => url.contains("news.ycombinator.com"),
    }
}

/// Collapse whitespace runs to single spaces and cap at `max_chars`,
/// marking truncation with `...`.
pub fn clean_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
