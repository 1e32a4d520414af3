//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    NoToken,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Admin access required")]
    RoleMismatch,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token encoding error: {0}")]
    Encoding(String),

    #[error("Invalid auth configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// HTTP status this failure maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NoToken
            | AuthError::Malformed
            | AuthError::SignatureInvalid
            | AuthError::Expired
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::RoleMismatch => StatusCode::FORBIDDEN,
            AuthError::PasswordHash(_) | AuthError::Encoding(_) | AuthError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used for the rejection metric and logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NoToken => "no_token",
            AuthError::Malformed => "malformed",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "expired",
            AuthError::RoleMismatch => "role_mismatch",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::PasswordHash(_) => "password_hash",
            AuthError::Encoding(_) => "encoding",
            AuthError::Configuration(_) => "configuration",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal faults never leak their detail to the client
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
