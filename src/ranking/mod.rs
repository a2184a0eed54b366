//! Ranking module for HNTLDR.
//!
//! This module records front-page ranking snapshots and selects the best
//! stories observed inside a time window.
//!
//! - [`source`]: Hacker News API client
//! - [`recorder`]: snapshot recorder and its background loop
//! - [`repository`]: append-only snapshot storage and SQL window selection
//! - [`window`]: in-memory window selection

pub mod recorder;
pub mod repository;
pub mod source;
pub mod types;
pub mod window;

pub use recorder::{RankingRecorder, RecorderLoop, DEFAULT_RECORD_INTERVAL_SECS};
pub use repository::RankingRepository;
pub use source::{HackerNewsClient, StoryItem, StorySource};
pub use types::{RankingSnapshot, TimeWindow, WindowedStory, DEFAULT_TOP_STORY_COUNT};
pub use window::{select_top, DEFAULT_SELECT_LIMIT};
