//! Digest run orchestration.
//!
//! One run: select candidates, compose, narrate, store the audio, then persist
//! the episode and its sources in a single transaction. Nothing is written to
//! the database unless every step succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::composer::DigestComposer;
use super::narrator::SpeechSynthesizer;
use crate::clock::Clock;
use crate::config::DigestConfig;
use crate::db::Database;
use crate::episode::{Episode, EpisodeRepository, EpisodeType, NewEpisode, NewEpisodeSource};
use crate::ranking::{RankingRepository, TimeWindow};
use crate::storage::AudioStorage;
use crate::{HntldrError, Result};

/// Storage key for an episode's audio.
pub fn audio_key(episode_type: EpisodeType, at: &DateTime<Utc>) -> String {
    format!(
        "hntldr-{}-{}.mp3",
        episode_type,
        at.format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

/// A daily or weekly digest run.
pub struct DigestRun {
    db: Arc<Database>,
    composer: DigestComposer,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    storage: AudioStorage,
    clock: Arc<dyn Clock>,
    daily_story_count: usize,
    weekly_story_count: usize,
}

impl DigestRun {
    /// Create a run from its collaborators.
    pub fn new(
        db: Arc<Database>,
        composer: DigestComposer,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        storage: AudioStorage,
        clock: Arc<dyn Clock>,
        config: &DigestConfig,
    ) -> Self {
        Self {
            db,
            composer,
            synthesizer,
            storage,
            clock,
            daily_story_count: config.daily_story_count,
            weekly_story_count: config.weekly_story_count,
        }
    }

    fn story_count(&self, episode_type: EpisodeType) -> usize {
        match episode_type {
            EpisodeType::Daily => self.daily_story_count,
            EpisodeType::Weekly => self.weekly_story_count,
        }
    }

    /// Generate and persist one episode for `window`.
    pub async fn run(&self, episode_type: EpisodeType, window: TimeWindow) -> Result<Episode> {
        info!(
            start = %window.start.to_rfc3339(),
            end = %window.end.to_rfc3339(),
            "Starting {} digest run",
            episode_type
        );

        let candidates = RankingRepository::new(self.db.pool())
            .select_top(&window, self.story_count(episode_type))
            .await?;
        if candidates.is_empty() {
            return Err(HntldrError::Validation(
                "no ranked stories in window".to_string(),
            ));
        }

        let digest = self.composer.compose(episode_type, &candidates).await?;
        let audio = self.synthesizer.synthesize(&digest.summary).await?;

        let key = audio_key(episode_type, &self.clock.now());
        self.storage.put(&key, &audio).await?;

        let new_episode = NewEpisode::new(episode_type, window.start, window.end)
            .with_title(&digest.title)
            .with_summary(&digest.summary)
            .with_audio_url(&key);
        let sources: Vec<NewEpisodeSource> =
            digest.stories.iter().map(|story| story.to_source()).collect();

        let episode = match EpisodeRepository::new(self.db.pool())
            .create_with_sources(&new_episode, &sources)
            .await
        {
            Ok(episode) => episode,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&key).await {
                    warn!("Failed to remove orphaned audio {}: {}", key, cleanup);
                }
                return Err(e);
            }
        };

        info!(id = %episode.id, title = %episode.title, "Stored {} episode", episode_type);
        Ok(episode)
    }
}
