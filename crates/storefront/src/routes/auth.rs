//! Admin authentication route handlers.
//!
//! Password login against argon2 hashes stored on users, logout and a
//! session status probe for the admin dashboard.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `GET /api/auth/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CurrentUser>,
}

/// Put `user` into a fresh session.
///
/// The session ID is cycled first so a pre-login ID cannot be reused.
pub(crate) async fn start_session(session: &Session, user: &User) -> Result<CurrentUser> {
    session.cycle_id().await?;
    let current = CurrentUser::from(user);
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, &current.username);
    Ok(current)
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = body?;
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = AuthService::new(state.storage())
        .login(&request.username, &request.password)
        .await
        .inspect_err(|_| {
            tracing::warn!(username = %request.username.trim(), "failed login attempt");
        })?;

    let current = start_session(&session, &user).await?;
    tracing::info!(user_id = %current.id, "admin logged in");

    Ok(Json(json!({ "message": "Login successful", "user": current })))
}

/// `POST /api/auth/logout`
#[instrument(skip(session, user))]
pub async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Json<Value>> {
    session.flush().await?;
    clear_sentry_user();
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "admin logged out");
    }
    Ok(Json(json!({ "message": "Logged out" })))
}

/// `GET /api/auth/status`
pub async fn status(OptionalAuth(user): OptionalAuth) -> Json<AuthStatus> {
    Json(AuthStatus {
        is_authenticated: user.is_some(),
        user,
    })
}
