//! Application module.
//!
//! Wires configuration into the pipelines and runs one command.

mod cli;

pub use cli::{parse_args, CliArgs, Command, DEFAULT_CONFIG_PATH, USAGE};

use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::datetime::{daily_window, weekly_window};
use crate::db::Database;
use crate::digest::{
    ContentScraper, DigestComposer, DigestRun, ElevenLabsClient, OpenAiClient, TextGenerator,
};
use crate::episode::{Episode, EpisodeType};
use crate::error::{HntldrError, Result};
use crate::newsletter::{NewsletterJob, NewsletterReport, SmtpMailer};
use crate::ranking::{
    HackerNewsClient, RankingRecorder, RankingSnapshot, RecorderLoop, StorySource, TimeWindow,
};
use crate::storage::AudioStorage;
use crate::subscriber::{CaptchaVerifier, DisabledCaptcha, TurnstileVerifier};
use crate::web::{AppState, WebServer};

/// Main application: configuration plus the shared database.
pub struct Application {
    config: Arc<Config>,
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl Application {
    /// Create a new application instance.
    pub fn new(config: Arc<Config>, db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { config, db, clock }
    }

    /// Open the configured database and create the application.
    pub async fn open(config: Config) -> Result<Self> {
        let db = Database::open(&config.database.path).await?;
        Ok(Self::new(
            Arc::new(config),
            Arc::new(db),
            Arc::new(SystemClock),
        ))
    }

    /// Get the database.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Get the configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Run one command to completion.
    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Serve => self.serve().await,
            Command::Record => {
                let snapshots = self.record().await?;
                info!("Recorded {} ranking snapshots", snapshots.len());
                Ok(())
            }
            Command::Digest {
                episode_type,
                window,
            } => {
                let episode = self.digest(episode_type, window).await?;
                info!(episode_id = %episode.id, title = %episode.title, "Episode published");
                Ok(())
            }
            Command::Newsletter { window } => {
                let report = self.newsletter(window).await?;
                info!(
                    week = report.week_number,
                    recipients = report.recipients,
                    failures = report.failures,
                    "Newsletter finished"
                );
                Ok(())
            }
        }
    }

    fn story_source(&self) -> Result<Arc<dyn StorySource>> {
        Ok(Arc::new(HackerNewsClient::new(&self.config.hacker_news)?))
    }

    fn text_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        Ok(Arc::new(OpenAiClient::new(&self.config.generation)?))
    }

    fn audio_storage(&self) -> Result<AudioStorage> {
        let storage = &self.config.storage;
        AudioStorage::new(
            &storage.audio_path,
            storage.signing_secret.clone(),
            storage.url_ttl_secs,
        )
    }

    fn recorder(&self) -> Result<RankingRecorder> {
        Ok(
            RankingRecorder::new(self.db.clone(), self.story_source()?, self.clock.clone())
                .with_top_story_count(self.config.hacker_news.top_story_count),
        )
    }

    /// Take one ranking snapshot.
    pub async fn record(&self) -> Result<Vec<RankingSnapshot>> {
        self.recorder()?.record_snapshot().await
    }

    /// Generate one episode. Without a window the most recent daily or
    /// weekly window is used.
    pub async fn digest(
        &self,
        episode_type: EpisodeType,
        window: Option<TimeWindow>,
    ) -> Result<Episode> {
        let window = match window {
            Some(window) => window,
            None => self.default_window(episode_type)?,
        };

        let digest = &self.config.digest;
        let scraper = if digest.scrape {
            Some(ContentScraper::new(
                digest.scrape_timeout_secs,
                digest.max_content_chars,
            )?)
        } else {
            None
        };
        let composer = DigestComposer::new(
            self.story_source()?,
            self.text_generator()?,
            scraper,
            &self.config.generation,
            digest,
        );

        DigestRun::new(
            self.db.clone(),
            composer,
            Arc::new(ElevenLabsClient::new(&self.config.narration)?),
            self.audio_storage()?,
            self.clock.clone(),
            digest,
        )
        .run(episode_type, window)
        .await
    }

    /// Send the weekly newsletter. Without a window the most recent weekly
    /// window is used.
    pub async fn newsletter(&self, window: Option<TimeWindow>) -> Result<NewsletterReport> {
        let window = match window {
            Some(window) => window,
            None => self.default_window(EpisodeType::Weekly)?,
        };

        NewsletterJob::new(
            self.db.clone(),
            self.story_source()?,
            self.text_generator()?,
            Arc::new(SmtpMailer::new(&self.config.mail)?),
            &self.config.generation,
            &self.config.digest,
            &self.config.mail,
        )
        .run(window)
        .await
    }

    fn default_window(&self, episode_type: EpisodeType) -> Result<TimeWindow> {
        let now = self.clock.now();
        match episode_type {
            EpisodeType::Daily => Ok(daily_window(now)),
            EpisodeType::Weekly => weekly_window(now, &self.config.digest.timezone),
        }
    }

    /// Run the web API, with the recorder loop in the background when
    /// enabled.
    pub async fn serve(&self) -> Result<()> {
        let recorder = if self.config.recorder.enabled {
            Some(RecorderLoop::with_interval(
                Arc::new(self.recorder()?),
                self.config.recorder.interval_secs,
            ))
        } else {
            None
        };

        if !self.config.web.enabled {
            return match recorder {
                Some(recorder) => {
                    recorder.run().await;
                    Ok(())
                }
                None => Err(HntldrError::Config(
                    "both web and recorder are disabled, nothing to serve".to_string(),
                )),
            };
        }

        let captcha: Arc<dyn CaptchaVerifier> = if self.config.captcha.enabled {
            Arc::new(TurnstileVerifier::new(&self.config.captcha)?)
        } else {
            Arc::new(DisabledCaptcha)
        };
        let state = AppState::new(
            self.db.clone(),
            self.audio_storage()?,
            self.clock.clone(),
            self.config.web.public_base_url.clone(),
        )
        .with_captcha(captcha)
        .with_cache_ttl(self.config.cache.latest_episode_ttl_secs);

        let server = WebServer::new(&self.config.web, Arc::new(state))?;
        let _recorder_handle = recorder.map(RecorderLoop::spawn);

        server.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    async fn create_app(config: Config) -> Application {
        let db = Database::open_in_memory().await.unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 5, 15, 0, 0).unwrap());
        Application::new(Arc::new(config), Arc::new(db), Arc::new(clock))
    }

    #[tokio::test]
    async fn test_default_windows() {
        let app = create_app(Config::default()).await;

        let daily = app.default_window(EpisodeType::Daily).unwrap();
        assert_eq!(daily.end, Utc.with_ymd_and_hms(2025, 3, 5, 15, 0, 0).unwrap());
        assert_eq!(daily.start, Utc.with_ymd_and_hms(2025, 3, 4, 15, 0, 0).unwrap());

        // Wednesday March 5th: the last complete week ran Fri Feb 21 to Fri Feb 28 (EST).
        let weekly = app.default_window(EpisodeType::Weekly).unwrap();
        assert_eq!(weekly.start, Utc.with_ymd_and_hms(2025, 2, 21, 5, 0, 0).unwrap());
        assert_eq!(weekly.end, Utc.with_ymd_and_hms(2025, 2, 28, 5, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_serve_with_nothing_enabled() {
        let mut config = Config::default();
        config.web.enabled = false;
        config.recorder.enabled = false;
        let app = create_app(config).await;

        assert!(matches!(app.serve().await, Err(HntldrError::Config(_))));
    }
}
