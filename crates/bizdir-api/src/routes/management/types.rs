//! Request/Response DTOs for management API

use bizdir_auth::Identity;
use bizdir_db::{User, UserRole};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token issued by signup or login
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserResponse,
}

/// The caller as seen through its token
#[derive(Serialize)]
pub struct IdentityResponse {
    pub subject: String,
    pub email: String,
    pub role: UserRole,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            subject: identity.subject,
            email: identity.email,
            role: identity.role,
        }
    }
}

// ==================== User Types ====================

/// Update role request
#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}
