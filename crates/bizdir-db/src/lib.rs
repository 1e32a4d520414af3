//! bizdir database layer
//!
//! This crate owns persistence for the directory's user accounts,
//! using SQLite via sqlx. The connection pool lives in an explicitly
//! owned [`Database`] handle that callers pass around.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
