//! Ranking recorder.
//!
//! Takes one snapshot of the front page: the current top story IDs plus each
//! story's score, stamped with a single `fetched_at` shared by the whole batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

use super::repository::RankingRepository;
use super::source::StorySource;
use super::types::{RankingSnapshot, DEFAULT_TOP_STORY_COUNT};
use crate::clock::Clock;
use crate::datetime::truncate_to_millis;
use crate::db::Database;
use crate::Result;

/// Default interval between snapshots (1 hour).
pub const DEFAULT_RECORD_INTERVAL_SECS: u64 = 3600;

/// Records front-page snapshots into the rankings table.
pub struct RankingRecorder {
    db: Arc<Database>,
    source: Arc<dyn StorySource>,
    clock: Arc<dyn Clock>,
    top_story_count: usize,
}

impl RankingRecorder {
    /// Create a recorder capturing the default number of stories.
    pub fn new(db: Arc<Database>, source: Arc<dyn StorySource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            source,
            clock,
            top_story_count: DEFAULT_TOP_STORY_COUNT,
        }
    }

    /// Set how many front-page stories each snapshot captures.
    pub fn with_top_story_count(mut self, count: usize) -> Self {
        self.top_story_count = count;
        self
    }

    /// Take a snapshot stamped with the current time.
    pub async fn record_snapshot(&self) -> Result<Vec<RankingSnapshot>> {
        let fetched_at = truncate_to_millis(self.clock.now());
        self.record_snapshot_at(fetched_at).await
    }

    /// Take a snapshot stamped with `fetched_at`.
    ///
    /// Nothing is written unless every story fetch succeeds. Re-running with
    /// the same `fetched_at` leaves the table unchanged.
    pub async fn record_snapshot_at(
        &self,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<RankingSnapshot>> {
        let fetched_at = truncate_to_millis(fetched_at);

        let mut ids = self.source.top_story_ids().await?;
        ids.truncate(self.top_story_count);
        debug!("Fetching details for {} top stories", ids.len());

        let items = try_join_all(ids.iter().map(|&id| self.source.story(id))).await?;

        let snapshots: Vec<RankingSnapshot> = items
            .iter()
            .enumerate()
            .map(|(i, item)| RankingSnapshot {
                story_id: item.id,
                rank: (i + 1) as i32,
                score: item.score,
                story_time: item.created_at(),
                fetched_at,
            })
            .collect();

        let inserted = RankingRepository::new(self.db.pool())
            .insert_batch(&snapshots)
            .await?;

        info!(
            fetched_at = %fetched_at.to_rfc3339(),
            stories = snapshots.len(),
            inserted,
            "Recorded ranking snapshot"
        );

        Ok(snapshots)
    }
}

/// Background loop taking a snapshot on a fixed interval.
///
/// A failed tick is logged and the next tick tries again.
pub struct RecorderLoop {
    recorder: Arc<RankingRecorder>,
    interval: Duration,
}

impl RecorderLoop {
    /// Create a loop with the default interval.
    pub fn new(recorder: Arc<RankingRecorder>) -> Self {
        Self::with_interval(recorder, DEFAULT_RECORD_INTERVAL_SECS)
    }

    /// Create a loop with a custom interval.
    pub fn with_interval(recorder: Arc<RankingRecorder>, interval_secs: u64) -> Self {
        Self {
            recorder,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Run forever.
    pub async fn run(&self) {
        info!(
            "Ranking recorder started (interval: {} seconds)",
            self.interval.as_secs()
        );

        let mut timer = interval(self.interval);
        loop {
            timer.tick().await;
            if let Err(e) = self.recorder.record_snapshot().await {
                error!("Ranking snapshot failed: {}", e);
            }
        }
    }

    /// Spawn the loop onto the runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
