//! API routes

mod health;
mod management;
pub mod metrics;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

pub use management::validation::{validate_email, validate_password};

/// Request bodies on this API are small JSON documents
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Accounts and admin back office
        .merge(management::routes(&state))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
