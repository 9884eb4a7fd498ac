//! SSO login through the configured [`IdentityProvider`].
//!
//! ```text
//! GET /api/auth/sso           -> store CSRF state, redirect to provider
//! GET /api/auth/sso/callback  -> check state, exchange code, log in, redirect /admin
//! ```
//!
//! [`IdentityProvider`]: crate::services::identity::IdentityProvider

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::routes::auth::start_session;
use crate::services::auth::{AuthError, AuthService};
use crate::services::identity::random_token;
use crate::state::AppState;

/// Length of the CSRF state parameter.
const STATE_LENGTH: usize = 32;

const CALLBACK_PATH: &str = "/api/auth/sso/callback";

/// Where the browser lands after a successful SSO login.
const ADMIN_LANDING: &str = "/admin";

fn callback_url(state: &AppState) -> Result<Url> {
    state
        .config()
        .url_for(CALLBACK_PATH)
        .map_err(|e| AppError::Internal(format!("building SSO callback URL: {e}")))
}

/// `GET /api/auth/sso`
#[instrument(skip(state, session))]
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let csrf_state = random_token(STATE_LENGTH);
    session.insert(session_keys::SSO_STATE, &csrf_state).await?;

    let url = state
        .identity()
        .authorization_url(&callback_url(&state)?, &csrf_state)?;
    tracing::debug!(provider = state.identity().name(), "redirecting to identity provider");
    Ok(Redirect::to(url.as_str()))
}

/// Callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /api/auth/sso/callback`
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    // The stored state is single-use whether or not it matches.
    let expected: Option<String> = session.remove(session_keys::SSO_STATE).await?;

    if let Some(error) = query.error {
        tracing::warn!(%error, "identity provider returned an error");
        return Err(AppError::Unauthorized("SSO login failed".to_string()));
    }

    let (Some(expected), Some(received)) = (expected, query.state) else {
        return Err(AuthError::InvalidSessionState.into());
    };
    if expected != received {
        tracing::warn!("SSO state mismatch");
        return Err(AuthError::InvalidSessionState.into());
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let identity = state
        .identity()
        .exchange_code(&code, &callback_url(&state)?)
        .await?;
    let user = AuthService::new(state.storage())
        .find_or_provision(&identity)
        .await?;

    let current = start_session(&session, &user).await?;
    tracing::info!(
        user_id = %current.id,
        provider = state.identity().name(),
        "admin logged in via SSO"
    );

    Ok(Redirect::to(ADMIN_LANDING))
}
