//! User administration routes (admin only)

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, put},
};
use bizdir_auth::{Identity, require_admin};
use bizdir_db::UserRole;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

use super::types::{UpdateRoleRequest, UserResponse};

// ==================== User Routes ====================

/// GET /api/admin/users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/admin/users/{id}
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))?;

    Ok(Json(user.into()))
}

/// PUT /api/admin/users/{id}/role
///
/// Tokens issued before the change keep their old role until they expire.
async fn update_user_role(
    admin: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role = UserRole::from_str(&request.role)
        .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", request.role)))?;

    debug!("Updating role of user {} to {}", id, role);

    if !state.db.update_user_role(id, role).await? {
        return Err(ApiError::NotFound(format!("User {}", id)));
    }

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))?;

    info!("Admin {} set role of {} to {}", admin.subject, user.email, role);

    Ok(Json(user.into()))
}

/// DELETE /api/admin/users/{id}
async fn delete_user(
    admin: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if admin.subject == id.to_string() {
        return Err(ApiError::BadRequest(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    debug!("Deleting user: {}", id);

    if state.db.delete_user(id).await? {
        info!("Admin {} deleted user {}", admin.subject, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User {}", id)))
    }
}

/// Create user routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", get(get_user).delete(delete_user))
        .route("/api/admin/users/{id}/role", put(update_user_role))
        .route_layer(from_fn_with_state(state.tokens.clone(), require_admin))
}
