//! Application state

use bizdir_auth::TokenCodec;
use bizdir_db::Database;
use std::sync::Arc;

/// Prometheus exporter handle rendered by `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
///
/// The database handle and the token codec are built once at start-up and
/// handed to the router; neither is reachable through a global.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenCodec>) -> Self {
        Self { db, tokens }
    }
}
