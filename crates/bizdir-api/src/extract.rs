//! Extractors that reject with the API's JSON error body

use axum::extract::{FromRequestParts, Path};

use crate::error::ApiError;

/// `Path` whose parse failures become a 400 `{ "error": ... }` response
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
