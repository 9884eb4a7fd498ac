//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (store ping)
//!
//! # Menu
//! GET    /api/categories                  - Category list
//! POST   /api/categories                  - Create category (admin)
//! GET    /api/menu-items                  - Menu
//! POST   /api/menu-items                  - Create dish (admin)
//! GET    /api/menu-items/{id}             - One dish
//! PUT    /api/menu-items/{id}             - Partial update (admin)
//! DELETE /api/menu-items/{id}             - Delete dish (admin)
//! GET    /api/menu-items/category/{id}    - Dishes in a category
//!
//! # Orders
//! POST   /api/orders                      - Place order
//! GET    /api/orders                      - All orders with items (admin, ?status=)
//! GET    /api/orders/{id}                 - Order and its items
//! PUT    /api/orders/{id}/status          - Change status (admin)
//!
//! # Auth
//! POST   /api/auth/login                  - Password login (rate limited)
//! POST   /api/auth/logout                 - Destroy session
//! GET    /api/auth/status                 - Who am I
//! GET    /api/auth/sso                    - Start SSO
//! GET    /api/auth/sso/callback           - Finish SSO
//! ```

pub mod auth;
pub mod menu;
pub mod orders;
pub mod sso;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    create_session_layer, login_rate_limiter, request_id_middleware, security_headers_middleware,
    session_key_rotation_middleware,
};
use crate::state::AppState;

/// Create the menu and category routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/categories",
            get(menu::list_categories).post(menu::create_category),
        )
        .route(
            "/api/menu-items",
            get(menu::list_menu_items).post(menu::create_menu_item),
        )
        .route(
            "/api/menu-items/{id}",
            get(menu::get_menu_item)
                .put(menu::update_menu_item)
                .delete(menu::delete_menu_item),
        )
        .route(
            "/api/menu-items/category/{category_id}",
            get(menu::list_menu_items_by_category),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders).post(orders::create_order))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/status", put(orders::update_order_status))
}

/// Create the auth routes router.
///
/// `trust_proxy` is passed to the login rate limiter.
pub fn auth_routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login).layer(login_rate_limiter(trust_proxy)))
        .route("/logout", post(auth::logout))
        .route("/status", get(auth::status))
        .route("/sso", get(sso::login))
        .route("/sso/callback", get(sso::callback))
}

/// Create all routes for the storefront.
pub fn routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(menu_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/auth", auth_routes(trust_proxy))
}

/// The complete application: routes, middleware stack and state.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.session_keys());
    let session_keys = state.session_keys().clone();

    routes(state.config().trust_proxy)
        .layer(session_layer)
        .layer(from_fn_with_state(
            session_keys,
            session_key_rotation_middleware,
        ))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.storage().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
