//! HNTLDR - Hacker News TL;DR
//!
//! Records the Hacker News front page every hour, picks the best stories of
//! each day and week, and turns them into narrated episodes and a weekly
//! newsletter.

pub mod app;
pub mod cache;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod db;
pub mod digest;
pub mod episode;
pub mod error;
pub mod logging;
pub mod newsletter;
pub mod ranking;
pub mod storage;
pub mod subscriber;
pub mod web;

pub use app::Application;
pub use config::Config;
pub use db::Database;
pub use error::{HntldrError, Result};
