//! Session-token authentication
//!
//! Members authenticate once with email and password and receive an opaque
//! session token; subsequent requests carry it in the `X-Session-Token`
//! header. Passwords are stored as SHA-256 hex digests.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use lucid_common::types::{User, UserRole};

use crate::db::{sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Header carrying the session token
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// SHA-256 hex digest of a password
pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Resolve the session token in `headers` to its user, or 401.
pub async fn require_session(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let token = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing session token".to_string()))?;

    sessions::get_session_user(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid or expired session".to_string()))
}

/// Like [`require_session`], but the user must be an admin.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let user = require_session(state, headers).await?;
    if user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("admin access required".to_string()));
    }
    Ok(user)
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    email: String,
    password: String,
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("valid email required".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    if users::load_user(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("account already exists".to_string()));
    }

    let user = User::new(email.clone());
    users::save_user(&state.db, &user, &digest_password(&req.password)).await?;
    let token = sessions::create_session(&state.db, &user).await?;

    info!(email = %email, "new member registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": user })),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<Value>> {
    let email = req.email.trim().to_lowercase();

    let (user, stored_digest) = users::load_user_with_digest(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    if digest_password(&req.password) != stored_digest {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let token = sessions::create_session(&state.db, &user).await?;
    info!(email = %email, "member logged in");
    Ok(Json(json!({ "token": token, "user": user })))
}

/// GET /api/auth/session - the current session's user
async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<User>> {
    let user = require_session(&state, &headers).await?;
    Ok(Json(user))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    if let Some(token) = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        sessions::delete_session(&state.db, token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Build authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/session", get(current_session))
        .route("/api/auth/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        // echo -n "secret" | sha256sum
        assert_eq!(
            digest_password("secret"),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }

    #[test]
    fn digest_differs_per_password() {
        assert_ne!(digest_password("a"), digest_password("b"));
    }
}
