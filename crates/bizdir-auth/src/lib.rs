//! bizdir authentication and authorization
//!
//! Stateless bearer tokens (HS256 JWTs) carrying subject, email and role,
//! plus the axum guards that turn them into 401/403 decisions.

pub mod authenticator;
pub mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use authenticator::{authenticate, extract_token};
pub use error::AuthError;
pub use guard::{require_admin, require_auth};
pub use password::{hash_password, verify_password};
pub use token::{Claims, Identity, TokenCodec};
