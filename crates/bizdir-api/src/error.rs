//! API error types

use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] bizdir_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] bizdir_auth::AuthError),
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("{} not found", msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Database(e) => match e {
                bizdir_db::DbError::Duplicate(msg) => (StatusCode::CONFLICT, msg),
                other => {
                    error!("Database error: {}", other);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
                }
            },
            ApiError::Auth(e) => {
                if e.status() == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("Auth error: {}", e);
                }
                return e.into_response();
            }
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
