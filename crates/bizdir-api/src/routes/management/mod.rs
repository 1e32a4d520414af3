//! Management API routes
//!
//! Account signup/login, the caller's own identity, and the admin-only user
//! administration of the back office.

pub mod auth;
pub mod types;
pub mod users;
pub mod validation;

use axum::Router;

use crate::state::AppState;

/// Create management API routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes(state))
        .merge(users::routes(state))
}
