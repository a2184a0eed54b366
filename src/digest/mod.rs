//! Digest module for HNTLDR.
//!
//! Produces daily and weekly audio episodes from recorded rankings.
//!
//! - [`generator`]: hosted chat completion client
//! - [`scraper`]: linked page text extraction
//! - [`narrator`]: hosted text-to-speech client
//! - [`composer`]: script and title generation
//! - [`pipeline`]: end-to-end digest run

pub mod composer;
pub mod generator;
pub mod narrator;
pub mod pipeline;
pub mod scraper;

pub use composer::{resolve_stories, strip_quotes, ComposedDigest, DigestComposer, DigestStory};
pub use generator::{CompletionRequest, OpenAiClient, TextGenerator};
pub use narrator::{ElevenLabsClient, SpeechSynthesizer};
pub use pipeline::{audio_key, DigestRun};
pub use scraper::ContentScraper;
