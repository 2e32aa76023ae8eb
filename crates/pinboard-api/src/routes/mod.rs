//! API routes

mod auth;
mod health;
pub mod metrics;
mod posts;
pub mod types;
mod users;
mod votes;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

pub use auth::CurrentUser;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Login
        .merge(auth::routes())
        // Registration and lookup
        .merge(users::routes())
        // Posts CRUD
        .merge(posts::routes())
        // Voting
        .merge(votes::routes())
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
