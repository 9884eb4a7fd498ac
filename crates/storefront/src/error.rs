//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body is `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::auth::AuthError;
use crate::services::identity::IdentityError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement or status change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Identity provider failed during SSO.
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Request body failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) | RepositoryError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Repository(err) | Self::Order(OrderError::Repository(err)) => {
                repository_status(err)
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidSessionState => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(OrderError::Checkout(_) | OrderError::UnknownStatus(_))
            | Self::Validation(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Identity(IdentityError::InvalidCode) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Identity(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message shown to the client. Server-side details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::Repository(err) | Self::Order(OrderError::Repository(err)) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                other => other.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::InvalidSessionState => {
                    "Login session expired, please try again".to_string()
                }
                _ => "Internal server error".to_string(),
            },
            Self::Order(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Identity(IdentityError::InvalidCode) => "SSO login failed".to_string(),
            Self::Identity(_) => "External service error".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use tajine_house_core::checkout::CheckoutError;
    use tajine_house_core::{OrderStatus, ParseOrderStatusError};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_message(err: AppError) -> String {
        let bytes = err.into_response().into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["message"].as_str().unwrap().to_owned()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 12".to_string());
        assert_eq!(err.to_string(), "Not found: order 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::InvalidResponse("x".into()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_order_errors_map_to_client_statuses() {
        assert_eq!(
            get_status(OrderError::UnknownStatus(ParseOrderStatusError("shipped".into())).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(OrderError::Checkout(CheckoutError::EmptyCart).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                OrderError::Repository(RepositoryError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(OrderError::Repository(RepositoryError::NotFound).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_body_is_json_message() {
        let err = AppError::Order(OrderError::Checkout(CheckoutError::BelowMinimum {
            subtotal: Decimal::new(5000, 2),
            minimum: Decimal::new(8000, 2),
            shortfall: Decimal::new(3000, 2),
        }));
        assert_eq!(
            body_message(err).await,
            "minimum order is $80.00; add $30.00 more to check out"
        );

        // Internal details never reach the client.
        let err = AppError::Internal("db exploded".to_string());
        assert_eq!(body_message(err).await, "Internal server error");
    }
}
