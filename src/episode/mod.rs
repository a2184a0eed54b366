//! Episode module for HNTLDR.
//!
//! Episodes are generated digests (narration script plus audio) together with
//! the stories they cite.

mod repository;
mod types;

pub use repository::EpisodeRepository;
pub use types::{
    Episode, EpisodeSource, EpisodeType, EpisodeWithSources, NewEpisode, NewEpisodeSource,
};
