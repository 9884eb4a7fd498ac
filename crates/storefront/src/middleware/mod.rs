//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session key rotation (re-sign cookies from the previous secret)
//! 6. Session layer (tower-sessions, signed cookie, `MemoryStore`)
//! 7. Rate limiting on `/api/auth/login` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, set_current_user};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{
    SESSION_COOKIE_NAME, SessionKeys, create_session_layer, session_key_rotation_middleware,
};
