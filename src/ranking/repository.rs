//! Ranking snapshot repository.

use super::types::{RankingSnapshot, TimeWindow, WindowedStory};
use crate::datetime::{parse_stored_timestamp, to_db_timestamp};
use crate::db::DbPool;
use crate::{HntldrError, Result};

/// Row type for a ranking snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RankingRow {
    story_id: i64,
    rank: i32,
    score: i64,
    story_time: String,
    fetched_at: String,
}

impl TryFrom<RankingRow> for RankingSnapshot {
    type Error = HntldrError;

    fn try_from(row: RankingRow) -> Result<Self> {
        Ok(RankingSnapshot {
            story_id: row.story_id,
            rank: row.rank,
            score: row.score,
            story_time: parse_stored_timestamp("story_time", &row.story_time)?,
            fetched_at: parse_stored_timestamp("fetched_at", &row.fetched_at)?,
        })
    }
}

impl TryFrom<RankingRow> for WindowedStory {
    type Error = HntldrError;

    fn try_from(row: RankingRow) -> Result<Self> {
        let snapshot = RankingSnapshot::try_from(row)?;
        Ok(WindowedStory::from(&snapshot))
    }
}

/// Repository for the append-only `rankings` table.
pub struct RankingRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RankingRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a snapshot batch in one transaction.
    ///
    /// Rows whose `(story_id, fetched_at)` already exists are skipped. Returns
    /// the number of rows actually inserted. Any other error rolls back the
    /// whole batch.
    pub async fn insert_batch(&self, snapshots: &[RankingSnapshot]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for snapshot in snapshots {
            let result = sqlx::query(
                r#"
                INSERT INTO rankings (story_id, rank, score, story_time, fetched_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (story_id, fetched_at) DO NOTHING
                "#,
            )
            .bind(snapshot.story_id)
            .bind(snapshot.rank)
            .bind(snapshot.score)
            .bind(to_db_timestamp(&snapshot.story_time))
            .bind(to_db_timestamp(&snapshot.fetched_at))
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Total number of snapshot rows.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rankings")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// All snapshots fetched inside the window, oldest first.
    pub async fn list_in_window(&self, window: &TimeWindow) -> Result<Vec<RankingSnapshot>> {
        let rows = sqlx::query_as::<_, RankingRow>(
            r#"
            SELECT story_id, rank, score, story_time, fetched_at
            FROM rankings
            WHERE fetched_at >= $1 AND fetched_at < $2
            ORDER BY fetched_at ASC, rank ASC
            "#,
        )
        .bind(to_db_timestamp(&window.start))
        .bind(to_db_timestamp(&window.end))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(RankingSnapshot::try_from).collect()
    }

    /// Top `limit` stories in the window by their best observed score.
    ///
    /// Same selection and ordering as [`super::window::select_top`].
    pub async fn select_top(&self, window: &TimeWindow, limit: usize) -> Result<Vec<WindowedStory>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RankingRow>(
            r#"
            SELECT story_id, rank, score, story_time, fetched_at
            FROM (
                SELECT story_id, rank, score, story_time, fetched_at,
                       ROW_NUMBER() OVER (
                           PARTITION BY story_id
                           ORDER BY score DESC, fetched_at ASC
                       ) AS rn
                FROM rankings
                WHERE fetched_at >= $1 AND fetched_at < $2
            )
            WHERE rn = 1
            ORDER BY score DESC, fetched_at ASC, story_id ASC
            LIMIT $3
            "#,
        )
        .bind(to_db_timestamp(&window.start))
        .bind(to_db_timestamp(&window.end))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(WindowedStory::try_from).collect()
    }
}
