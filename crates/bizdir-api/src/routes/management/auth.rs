//! Account signup, login and identity routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bizdir_auth::{AuthError, Identity, hash_password, require_auth, verify_password};
use bizdir_db::{NewUser, User, UserRole};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{AuthResponse, IdentityResponse, LoginRequest, SignupRequest, UserResponse};
use super::validation::{
    check_password_upper_bound, validate_email, validate_name, validate_password,
};

/// Valid Argon2 hash that no password verifies against, used when the email
/// is unknown so the response time does not reveal which accounts exist.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Sign a fresh token for a stored user
fn issue_for(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let identity = Identity::new(user.id.to_string(), &user.email, user.role);
    let token = state.tokens.issue(&identity)?;

    Ok(AuthResponse {
        token,
        expires_in: state.tokens.validity().num_seconds(),
        user: UserResponse::from(user),
    })
}

// ==================== Auth Routes ====================

/// POST /api/auth/signup
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_name(&request.name)?;

    debug!("Signup attempt for: {}", request.email);

    let password_hash = hash_password(&request.password)?;

    // Self-service accounts never start as admin
    let user = state
        .db
        .insert_user(NewUser {
            email: request.email,
            name: request.name.trim().to_string(),
            password_hash,
            role: UserRole::User,
        })
        .await?;

    info!("Created account {} ({})", user.id, user.email);

    Ok((StatusCode::CREATED, Json(issue_for(&state, user)?)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    check_password_upper_bound(&request.password)?;

    debug!("Login attempt for: {}", request.email);

    let user_result = state.db.get_user_by_email(&request.email).await?;

    // Always run one verification, against a dummy hash if needed
    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    info!("User {} logged in", user.email);

    Ok(Json(issue_for(&state, user)?))
}

/// GET /api/auth/me
async fn me(identity: Identity) -> Json<IdentityResponse> {
    Json(identity.into())
}

/// Create auth routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(from_fn_with_state(state.tokens.clone(), require_auth));

    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use bizdir_db::UserRole;
    use serde_json::json;

    use crate::routes::testing::{PASSWORD, app, call, seed_user, test_state};

    #[tokio::test]
    async fn test_signup_issues_user_token() {
        let state = test_state().await;

        let (status, body) = call(
            app(&state),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "Owner@Bakery.Example",
                "password": "sourdough-daily",
                "name": "Corner Bakery"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "owner@bakery.example");
        assert_eq!(body["user"]["role"], "user");
        assert_eq!(body["expires_in"], 24 * 3600);
        assert!(body["user"].get("password_hash").is_none());

        let token = body["token"].as_str().unwrap();
        let (status, me) = call(app(&state), Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "owner@bakery.example");
        assert_eq!(me["role"], "user");
        assert_eq!(me["subject"], body["user"]["id"].to_string());
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email() {
        let state = test_state().await;
        seed_user(&state, "taken@shop.example", UserRole::User).await;

        let (status, body) = call(
            app(&state),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "taken@shop.example",
                "password": "long-enough-pass",
                "name": "Second"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn test_signup_validates_input() {
        let state = test_state().await;

        let (status, body) = call(
            app(&state),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "not-an-email", "password": "long-enough-pass", "name": "X" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Email address is invalid" }));

        let (status, _) = call(
            app(&state),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "a@b.com", "password": "short", "name": "X" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let state = test_state().await;
        let admin = seed_user(&state, "admin@dir.example", UserRole::Admin).await;

        let (status, body) = call(
            app(&state),
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@dir.example", "password": PASSWORD })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], admin.id);
        assert_eq!(body["user"]["role"], "admin");

        let identity = state.tokens.verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(identity.subject, admin.id.to_string());
        assert_eq!(identity.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let state = test_state().await;
        seed_user(&state, "owner@shop.example", UserRole::User).await;

        for (email, password) in [
            ("owner@shop.example", "wrong-password"),
            ("nobody@shop.example", PASSWORD),
        ] {
            let (status, body) = call(
                app(&state),
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "error": "Invalid credentials" }));
        }
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let state = test_state().await;

        let (status, body) = call(app(&state), Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "No token provided" }));

        let (status, body) =
            call(app(&state), Method::GET, "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Malformed token" }));
    }
}
