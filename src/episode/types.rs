//! Episode types for HNTLDR.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::HntldrError;

/// Kind of digest an episode covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    Daily,
    Weekly,
}

impl EpisodeType {
    /// Value stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeType::Daily => "daily",
            EpisodeType::Weekly => "weekly",
        }
    }
}

impl fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpisodeType {
    type Err = HntldrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(EpisodeType::Daily),
            "weekly" => Ok(EpisodeType::Weekly),
            other => Err(HntldrError::Validation(format!(
                "unknown episode type: {other}"
            ))),
        }
    }
}

/// A published digest episode. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// UUID.
    pub id: String,
    pub episode_type: EpisodeType,
    /// Window start (inclusive).
    pub start_date: DateTime<Utc>,
    /// Window end (exclusive).
    pub end_date: DateTime<Utc>,
    pub title: String,
    /// Narration script.
    pub summary: String,
    /// Audio storage key.
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
}

/// A story cited by an episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeSource {
    pub id: i64,
    pub episode_id: String,
    /// Order the story was narrated in, starting at 0.
    pub position: i32,
    pub story_id: Option<i64>,
    pub url: String,
    pub title: String,
    pub points: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

/// An episode together with its cited sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeWithSources {
    pub episode: Episode,
    pub sources: Vec<EpisodeSource>,
}

/// New episode for creation.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub episode_type: EpisodeType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub title: String,
    pub summary: String,
    pub audio_url: String,
}

impl NewEpisode {
    /// Create a new episode covering `[start_date, end_date)`.
    pub fn new(
        episode_type: EpisodeType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            episode_type,
            start_date,
            end_date,
            title: String::new(),
            summary: String::new(),
            audio_url: String::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the narration script.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the audio storage key.
    pub fn with_audio_url(mut self, audio_url: impl Into<String>) -> Self {
        self.audio_url = audio_url.into();
        self
    }
}

/// New episode source for creation.
#[derive(Debug, Clone)]
pub struct NewEpisodeSource {
    pub story_id: Option<i64>,
    pub url: String,
    pub title: String,
    pub points: i64,
    pub comments_count: i64,
}
