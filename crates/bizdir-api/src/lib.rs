//! bizdir REST API
//!
//! This crate provides the Axum-based HTTP API for the directory:
//! account signup and login, the signed-in user's identity, and the admin
//! back office for user accounts.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, validate_email, validate_password};
pub use state::{AppState, MetricsHandle};
