//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use pinboard_auth::TokenService;
use pinboard_db::Database;
use std::sync::Arc;

/// Handle used to render the Prometheus scrape endpoint
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
///
/// The token service is immutable after startup; the database is a cloned
/// pool handle. Nothing here is mutated across requests.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }
}
