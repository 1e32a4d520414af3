//! Route guards for Axum
//!
//! `require_auth` and `require_admin` are plain middleware functions, so any
//! route or router can be wrapped with either one through
//! `axum::middleware::from_fn_with_state`. On success the guard stores the
//! [`Identity`] in the request extensions, where handlers pick it up as an
//! ordinary extractor argument.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::authenticator::authenticate;
use crate::error::AuthError;
use crate::token::{Identity, TokenCodec};

fn reject(error: AuthError, path: &str) -> AuthError {
    warn!(reason = error.reason(), path, "Rejected request");
    metrics::counter!("bizdir_auth_rejections_total", "reason" => error.reason()).increment(1);
    error
}

/// Require any authenticated identity
///
/// Responds 401 when the request carries no valid token.
pub async fn require_auth(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate(&codec, request.headers())
        .map_err(|e| reject(e, request.uri().path()))?;

    debug!("Authenticated subject: {} ({})", identity.subject, identity.role);

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Require an authenticated admin
///
/// Authentication is checked first: a request without a valid token gets 401
/// even here, and only an authenticated non-admin gets 403.
pub async fn require_admin(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate(&codec, request.headers())
        .map_err(|e| reject(e, request.uri().path()))?;

    if !identity.is_admin() {
        return Err(reject(AuthError::RoleMismatch, request.uri().path()));
    }

    debug!("Authenticated admin: {}", identity.subject);

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when a guard ran for this route
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AuthError::NoToken)
    }
}
