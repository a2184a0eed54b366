//! Episode repository for HNTLDR.

use uuid::Uuid;

use super::types::{
    Episode, EpisodeSource, EpisodeType, EpisodeWithSources, NewEpisode, NewEpisodeSource,
};
use crate::datetime::{parse_stored_timestamp, to_db_timestamp};
use crate::db::DbPool;
use crate::{HntldrError, Result};

/// Row type for an episode.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EpisodeRow {
    id: String,
    episode_type: String,
    start_date: String,
    end_date: String,
    title: String,
    summary: String,
    audio_url: String,
    created_at: String,
}

impl TryFrom<EpisodeRow> for Episode {
    type Error = HntldrError;

    fn try_from(row: EpisodeRow) -> Result<Self> {
        Ok(Episode {
            episode_type: row
                .episode_type
                .parse::<EpisodeType>()
                .map_err(|e| HntldrError::Database(e.to_string()))?,
            start_date: parse_stored_timestamp("start_date", &row.start_date)?,
            end_date: parse_stored_timestamp("end_date", &row.end_date)?,
            created_at: parse_stored_timestamp("created_at", &row.created_at)?,
            id: row.id,
            title: row.title,
            summary: row.summary,
            audio_url: row.audio_url,
        })
    }
}

/// Row type for an episode source.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EpisodeSourceRow {
    id: i64,
    episode_id: String,
    position: i32,
    story_id: Option<i64>,
    url: String,
    title: String,
    points: i64,
    comments_count: i64,
    created_at: String,
}

impl TryFrom<EpisodeSourceRow> for EpisodeSource {
    type Error = HntldrError;

    fn try_from(row: EpisodeSourceRow) -> Result<Self> {
        Ok(EpisodeSource {
            created_at: parse_stored_timestamp("created_at", &row.created_at)?,
            id: row.id,
            episode_id: row.episode_id,
            position: row.position,
            story_id: row.story_id,
            url: row.url,
            title: row.title,
            points: row.points,
            comments_count: row.comments_count,
        })
    }
}

const EPISODE_COLUMNS: &str =
    "id, episode_type, start_date, end_date, title, summary, audio_url, created_at";

/// Repository for episodes and their sources.
pub struct EpisodeRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> EpisodeRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create an episode and its sources atomically.
    ///
    /// Either the episode and every source are stored, or nothing is.
    pub async fn create_with_sources(
        &self,
        episode: &NewEpisode,
        sources: &[NewEpisodeSource],
    ) -> Result<Episode> {
        if episode.start_date > episode.end_date {
            return Err(HntldrError::Validation(
                "episode start_date is after end_date".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO episodes (id, episode_type, start_date, end_date, title, summary, audio_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(episode.episode_type.as_str())
        .bind(to_db_timestamp(&episode.start_date))
        .bind(to_db_timestamp(&episode.end_date))
        .bind(&episode.title)
        .bind(&episode.summary)
        .bind(&episode.audio_url)
        .execute(&mut *tx)
        .await?;

        for (position, source) in sources.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO episode_sources
                    (episode_id, position, story_id, url, title, points, comments_count)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&id)
            .bind(position as i32)
            .bind(source.story_id)
            .bind(&source.url)
            .bind(&source.title)
            .bind(source.points)
            .bind(source.comments_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| HntldrError::NotFound("episode".into()))
    }

    /// Get an episode by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Episode>> {
        let query = format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE id = $1");
        let row = sqlx::query_as::<_, EpisodeRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Episode::try_from).transpose()
    }

    /// List all episodes, newest window first.
    pub async fn list(&self) -> Result<Vec<Episode>> {
        let query = format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes ORDER BY end_date DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, EpisodeRow>(&query)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Episode::try_from).collect()
    }

    /// The most recent episode, if any.
    pub async fn latest(&self) -> Result<Option<Episode>> {
        let query = format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes ORDER BY end_date DESC, created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, EpisodeRow>(&query)
            .fetch_optional(self.pool)
            .await?;

        row.map(Episode::try_from).transpose()
    }

    /// Sources cited by an episode, highest points first.
    pub async fn sources_for(&self, episode_id: &str) -> Result<Vec<EpisodeSource>> {
        let rows = sqlx::query_as::<_, EpisodeSourceRow>(
            r#"
            SELECT id, episode_id, position, story_id, url, title, points, comments_count, created_at
            FROM episode_sources
            WHERE episode_id = $1
            ORDER BY points DESC, position ASC
            "#,
        )
        .bind(episode_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(EpisodeSource::try_from).collect()
    }

    /// Get an episode and its sources by ID.
    pub async fn get_with_sources(&self, id: &str) -> Result<Option<EpisodeWithSources>> {
        match self.get_by_id(id).await? {
            Some(episode) => self.attach_sources(episode).await.map(Some),
            None => Ok(None),
        }
    }

    /// The most recent episode and its sources, if any.
    pub async fn latest_with_sources(&self) -> Result<Option<EpisodeWithSources>> {
        match self.latest().await? {
            Some(episode) => self.attach_sources(episode).await.map(Some),
            None => Ok(None),
        }
    }

    async fn attach_sources(&self, episode: Episode) -> Result<EpisodeWithSources> {
        let sources = self.sources_for(&episode.id).await?;
        Ok(EpisodeWithSources { episode, sources })
    }

    /// Number of stored episodes.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM episodes")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
