//! Configuration module for HNTLDR.

use serde::Deserialize;
use std::path::Path;

use crate::{HntldrError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/hntldr.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/hntldr.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Whether the web API is enabled.
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Externally visible base URL, used to build signed media links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_web_enabled() -> bool {
    true
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            public_base_url: default_public_base_url(),
        }
    }
}

/// Hacker News story API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HackerNewsConfig {
    /// Base URL of the story API.
    #[serde(default = "default_hn_base_url")]
    pub base_url: String,
    /// Number of front-page stories recorded per snapshot.
    #[serde(default = "default_top_story_count")]
    pub top_story_count: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_hn_total_timeout")]
    pub total_timeout_secs: u64,
}

fn default_hn_base_url() -> String {
    "https://hacker-news.firebaseio.com".to_string()
}

fn default_top_story_count() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_hn_total_timeout() -> u64 {
    30
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_hn_base_url(),
            top_story_count: default_top_story_count(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_hn_total_timeout(),
        }
    }
}

/// Ranking recorder schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct RecorderConfig {
    /// Whether `serve` also runs the recorder on a timer.
    #[serde(default = "default_recorder_enabled")]
    pub enabled: bool,
    /// Interval between snapshots in seconds.
    #[serde(default = "default_recorder_interval")]
    pub interval_secs: u64,
}

fn default_recorder_enabled() -> bool {
    false
}

fn default_recorder_interval() -> u64 {
    3600 // 1 hour
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: default_recorder_enabled(),
            interval_secs: default_recorder_interval(),
        }
    }
}

/// Digest composition configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    /// Stories selected for a daily episode.
    #[serde(default = "default_story_count")]
    pub daily_story_count: usize,
    /// Stories selected for a weekly episode and the newsletter.
    #[serde(default = "default_story_count")]
    pub weekly_story_count: usize,
    /// Whether linked pages are scraped for context.
    #[serde(default = "default_scrape")]
    pub scrape: bool,
    /// Maximum characters of scraped text passed to the model.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Scrape timeout in seconds.
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,
    /// Name the narrator introduces themselves with.
    #[serde(default = "default_host_name")]
    pub host_name: String,
    /// Timezone used for the weekly Friday-to-Thursday window.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_story_count() -> usize {
    3
}

fn default_scrape() -> bool {
    true
}

fn default_max_content_chars() -> usize {
    8000
}

fn default_scrape_timeout() -> u64 {
    20
}

fn default_host_name() -> String {
    "Kevin".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            daily_story_count: default_story_count(),
            weekly_story_count: default_story_count(),
            scrape: default_scrape(),
            max_content_chars: default_max_content_chars(),
            scrape_timeout_secs: default_scrape_timeout(),
            host_name: default_host_name(),
            timezone: default_timezone(),
        }
    }
}

/// Hosted text generation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the chat completions API.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    /// API key (usually supplied via `HNTLDR_OPENAI_API_KEY`).
    #[serde(default)]
    pub api_key: String,
    /// Model used for the narration script.
    #[serde(default = "default_script_model")]
    pub script_model: String,
    /// Model used for cleanup, titles and subject lines.
    #[serde(default = "default_edit_model")]
    pub edit_model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_script_model() -> String {
    "gpt-4o".to_string()
}

fn default_edit_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            api_key: String::new(),
            script_model: default_script_model(),
            edit_model: default_edit_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// Hosted text-to-speech configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// Base URL of the text-to-speech API.
    #[serde(default = "default_narration_base_url")]
    pub base_url: String,
    /// API key (usually supplied via `HNTLDR_ELEVEN_LABS_API_KEY`).
    #[serde(default)]
    pub api_key: String,
    /// Voice identifier.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    /// Synthesis model identifier.
    #[serde(default = "default_tts_model")]
    pub model_id: String,
    /// Speaking speed.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Voice stability.
    #[serde(default = "default_stability")]
    pub stability: f32,
    /// Similarity boost.
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    /// Style exaggeration.
    #[serde(default = "default_style")]
    pub style: f32,
    /// Request timeout in seconds.
    #[serde(default = "default_narration_timeout")]
    pub timeout_secs: u64,
}

fn default_narration_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_voice_id() -> String {
    "3DR8c2yd30eztg65o4jV".to_string()
}

fn default_tts_model() -> String {
    "eleven_turbo_v2".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_style() -> f32 {
    0.45
}

fn default_narration_timeout() -> u64 {
    300
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            base_url: default_narration_base_url(),
            api_key: String::new(),
            voice_id: default_voice_id(),
            model_id: default_tts_model(),
            speed: default_speed(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: default_style(),
            timeout_secs: default_narration_timeout(),
        }
    }
}

/// Audio storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding synthesized audio.
    #[serde(default = "default_audio_path")]
    pub audio_path: String,
    /// Secret used to sign media URLs.
    #[serde(default)]
    pub signing_secret: String,
    /// Lifetime of a signed URL in seconds.
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,
}

fn default_audio_path() -> String {
    "data/audio".to_string()
}

fn default_url_ttl() -> u64 {
    3600 // 1 hour
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_path: default_audio_path(),
            signing_secret: String::new(),
            url_ttl_secs: default_url_ttl(),
        }
    }
}

/// Newsletter mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: String,
    /// SMTP password (usually supplied via `HNTLDR_SMTP_PASSWORD`).
    #[serde(default)]
    pub password: String,
    /// Sender address.
    #[serde(default = "default_from")]
    pub from: String,
    /// Public site URL used for links in the email.
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

fn default_smtp_port() -> u16 {
    465
}

fn default_from() -> String {
    "HNTLDR <updates@hntldr.news>".to_string()
}

fn default_site_url() -> String {
    "https://hntldr.news".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_from(),
            site_url: default_site_url(),
        }
    }
}

/// Captcha verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Whether subscribe requests must carry a valid captcha token.
    #[serde(default = "default_captcha_enabled")]
    pub enabled: bool,
    /// Verification endpoint.
    #[serde(default = "default_captcha_verify_url")]
    pub verify_url: String,
    /// Site secret (usually supplied via `HNTLDR_TURNSTILE_SECRET`).
    #[serde(default)]
    pub secret: String,
}

fn default_captcha_enabled() -> bool {
    true
}

fn default_captcha_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: default_captcha_enabled(),
            verify_url: default_captcha_verify_url(),
            secret: String::new(),
        }
    }
}

/// In-process cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long the latest episode is served from memory, in seconds.
    #[serde(default = "default_latest_episode_ttl")]
    pub latest_episode_ttl_secs: u64,
}

fn default_latest_episode_ttl() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            latest_episode_ttl_secs: default_latest_episode_ttl(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Story API configuration.
    #[serde(default)]
    pub hacker_news: HackerNewsConfig,
    /// Recorder schedule.
    #[serde(default)]
    pub recorder: RecorderConfig,
    /// Digest composition.
    #[serde(default)]
    pub digest: DigestConfig,
    /// Text generation.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Text-to-speech.
    #[serde(default)]
    pub narration: NarrationConfig,
    /// Audio storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Newsletter mail.
    #[serde(default)]
    pub mail: MailConfig,
    /// Captcha verification.
    #[serde(default)]
    pub captcha: CaptchaConfig,
    /// In-process caches.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HntldrError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| HntldrError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `HNTLDR_DATABASE_PATH`
    /// - `HNTLDR_OPENAI_API_KEY`
    /// - `HNTLDR_ELEVEN_LABS_API_KEY`
    /// - `HNTLDR_SMTP_PASSWORD`
    /// - `HNTLDR_SIGNING_SECRET`
    /// - `HNTLDR_TURNSTILE_SECRET`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        override_from_env("HNTLDR_DATABASE_PATH", &mut self.database.path);
        override_from_env("HNTLDR_OPENAI_API_KEY", &mut self.generation.api_key);
        override_from_env("HNTLDR_ELEVEN_LABS_API_KEY", &mut self.narration.api_key);
        override_from_env("HNTLDR_SMTP_PASSWORD", &mut self.mail.password);
        override_from_env("HNTLDR_SIGNING_SECRET", &mut self.storage.signing_secret);
        override_from_env("HNTLDR_TURNSTILE_SECRET", &mut self.captcha.secret);
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The web API is enabled but no signing secret is set
    /// - Captcha is enabled but no captcha secret is set
    /// - The digest timezone is unknown
    pub fn validate(&self) -> Result<()> {
        if self.web.enabled && self.storage.signing_secret.is_empty() {
            return Err(HntldrError::Config(
                "web API is enabled but storage.signing_secret is not set. \
                 Set it in config.toml or via HNTLDR_SIGNING_SECRET."
                    .to_string(),
            ));
        }
        if self.web.enabled && self.captcha.enabled && self.captcha.secret.is_empty() {
            return Err(HntldrError::Config(
                "captcha is enabled but captcha.secret is not set. \
                 Set it in config.toml or via HNTLDR_TURNSTILE_SECRET."
                    .to_string(),
            ));
        }
        if self.digest.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(HntldrError::Config(format!(
                "unknown digest.timezone: {}",
                self.digest.timezone
            )));
        }
        Ok(())
    }
}

fn override_from_env(key: &str, target: &mut String) {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.path, "data/hntldr.db");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/hntldr.log");

        assert!(config.web.enabled);
        assert_eq!(config.web.port, 8080);
        assert!(config.web.cors_origins.is_empty());

        assert_eq!(
            config.hacker_news.base_url,
            "https://hacker-news.firebaseio.com"
        );
        assert_eq!(config.hacker_news.top_story_count, 10);

        assert!(!config.recorder.enabled);
        assert_eq!(config.recorder.interval_secs, 3600);

        assert_eq!(config.digest.daily_story_count, 3);
        assert_eq!(config.digest.weekly_story_count, 3);
        assert_eq!(config.digest.max_content_chars, 8000);
        assert_eq!(config.digest.timezone, "America/New_York");

        assert_eq!(config.generation.script_model, "gpt-4o");
        assert_eq!(config.generation.edit_model, "gpt-4o-mini");

        assert_eq!(config.narration.model_id, "eleven_turbo_v2");
        assert_eq!(config.narration.stability, 0.5);

        assert_eq!(config.storage.url_ttl_secs, 3600);
        assert!(config.storage.signing_secret.is_empty());

        assert!(config.captcha.enabled);
        assert_eq!(config.cache.latest_episode_ttl_secs, 300);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
path = "custom/hn.sqlite"

[logging]
level = "debug"
file = "custom/logs/app.log"

[web]
enabled = true
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:3000"]
public_base_url = "https://api.example.com"

[hacker_news]
base_url = "http://localhost:9000"
top_story_count = 30
connect_timeout_secs = 5
total_timeout_secs = 15

[recorder]
enabled = true
interval_secs = 1800

[digest]
daily_story_count = 5
weekly_story_count = 7
scrape = false
max_content_chars = 4000
host_name = "Ada"
timezone = "Europe/Berlin"

[generation]
api_key = "sk-test"
script_model = "gpt-x"

[narration]
voice_id = "voice-1"
speed = 1.1

[storage]
audio_path = "custom/audio"
signing_secret = "s3cret"
url_ttl_secs = 600

[mail]
smtp_host = "smtp.example.com"
smtp_port = 587
from = "News <news@example.com>"

[captcha]
enabled = false

[cache]
latest_episode_ttl_secs = 60
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.database.path, "custom/hn.sqlite");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.web.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.web.public_base_url, "https://api.example.com");
        assert_eq!(config.hacker_news.base_url, "http://localhost:9000");
        assert_eq!(config.hacker_news.top_story_count, 30);
        assert!(config.recorder.enabled);
        assert_eq!(config.recorder.interval_secs, 1800);
        assert_eq!(config.digest.daily_story_count, 5);
        assert_eq!(config.digest.weekly_story_count, 7);
        assert!(!config.digest.scrape);
        assert_eq!(config.digest.host_name, "Ada");
        assert_eq!(config.generation.api_key, "sk-test");
        assert_eq!(config.generation.script_model, "gpt-x");
        assert_eq!(config.generation.edit_model, "gpt-4o-mini");
        assert_eq!(config.narration.voice_id, "voice-1");
        assert_eq!(config.narration.speed, 1.1);
        assert_eq!(config.storage.signing_secret, "s3cret");
        assert_eq!(config.storage.url_ttl_secs, 600);
        assert_eq!(config.mail.smtp_port, 587);
        assert!(!config.captcha.enabled);
        assert_eq!(config.cache.latest_episode_ttl_secs, 60);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database.path, "data/hntldr.db");
        assert_eq!(config.hacker_news.top_story_count, 10);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(HntldrError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(HntldrError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides() {
        let original = std::env::var("HNTLDR_SIGNING_SECRET").ok();

        std::env::set_var("HNTLDR_SIGNING_SECRET", "from-env");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.storage.signing_secret, "from-env");

        std::env::set_var("HNTLDR_SIGNING_SECRET", "");
        let mut config = Config::default();
        config.storage.signing_secret = "from-file".to_string();
        config.apply_env_overrides();
        assert_eq!(config.storage.signing_secret, "from-file");

        if let Some(val) = original {
            std::env::set_var("HNTLDR_SIGNING_SECRET", val);
        } else {
            std::env::remove_var("HNTLDR_SIGNING_SECRET");
        }
    }

    #[test]
    fn test_validate_requires_signing_secret() {
        let mut config = Config::default();
        config.captcha.enabled = false;

        let result = config.validate();
        assert!(matches!(result, Err(HntldrError::Config(msg)) if msg.contains("signing_secret")));

        config.storage.signing_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_captcha_secret() {
        let mut config = Config::default();
        config.storage.signing_secret = "secret".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(HntldrError::Config(msg)) if msg.contains("captcha")));

        config.captcha.secret = "turnstile".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_web_disabled() {
        let mut config = Config::default();
        config.web.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_timezone() {
        let mut config = Config::default();
        config.web.enabled = false;
        config.digest.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }
}
