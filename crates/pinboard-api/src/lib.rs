//! Pinboard REST API
//!
//! This crate provides the Axum-based HTTP API for Pinboard:
//! login, users, posts and votes.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{CurrentUser, create_router};
pub use state::{AppState, MetricsHandle};
