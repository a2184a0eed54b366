//! Ranking types for HNTLDR.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{HntldrError, Result};

/// Default number of front-page stories captured per snapshot.
pub const DEFAULT_TOP_STORY_COUNT: usize = 10;

/// One fetch-time observation of a story's rank and score.
///
/// Rows are append-only; `(story_id, fetched_at)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingSnapshot {
    /// External story ID.
    pub story_id: i64,
    /// 1-based position on the front page at fetch time.
    pub rank: i32,
    /// Score at fetch time.
    pub score: i64,
    /// When the story was submitted.
    pub story_time: DateTime<Utc>,
    /// When this snapshot was taken. Shared by every row of one run.
    pub fetched_at: DateTime<Utc>,
}

/// A story's best observation inside a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowedStory {
    /// External story ID.
    pub story_id: i64,
    /// Highest score observed in the window.
    pub score: i64,
    /// Rank recorded alongside that score.
    pub rank: i32,
    /// When the story was submitted.
    pub story_time: DateTime<Utc>,
    /// When the highest score was first observed.
    pub fetched_at: DateTime<Utc>,
}

impl From<&RankingSnapshot> for WindowedStory {
    fn from(snapshot: &RankingSnapshot) -> Self {
        Self {
            story_id: snapshot.story_id,
            score: snapshot.score,
            rank: snapshot.rank,
            story_time: snapshot.story_time,
            fetched_at: snapshot.fetched_at,
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(HntldrError::Validation(format!(
                "window start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at < self.end
    }

    /// Whether the window can contain anything at all.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
