//! Bearer credential extraction

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::AuthError;
use crate::token::{Identity, TokenCodec};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value
///
/// Only `Bearer <token>` is accepted. Anything else, including an empty
/// token, is treated as no token at all.
pub fn extract_token(header: Option<&str>) -> Option<&str> {
    header?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the identity behind a request's headers
///
/// Pure with respect to the headers and the current time.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    let token = extract_token(header).ok_or(AuthError::NoToken)?;
    codec.verify(token)
}
