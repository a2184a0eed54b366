//! Web API module for HNTLDR.
//!
//! Serves episodes and their sources, signed audio links and the newsletter
//! subscribe/unsubscribe endpoints.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
