//! Session middleware configuration.
//!
//! Sessions live in an in-process `MemoryStore` behind a signed cookie. The
//! signing key is derived from `STOREFRONT_SESSION_SECRET`. When
//! `STOREFRONT_SESSION_SECRET_PREVIOUS` is set, [`session_key_rotation_middleware`]
//! accepts cookies signed with the old key and re-signs them with the new one.
//!
//! Re-signing only keeps users logged in when the session store outlives the
//! process, i.e. a shared or persistent `SessionStore` swapped in for
//! `MemoryStore`. Changing the secret means a restart, and a restart empties
//! the `MemoryStore`, so with the default store every session ends anyway.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Cookie, CookieJar, Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "th_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session layer type used by the router.
pub type StorefrontSessionLayer = SessionManagerLayer<MemoryStore, SignedCookie>;

/// Cookie signing keys: the active one and, during rotation, the one before.
#[derive(Clone)]
pub struct SessionKeys {
    current: Key,
    previous: Option<Key>,
    secure: bool,
}

impl SessionKeys {
    /// Derive the keys from the configured secrets.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            current: derive_key(&config.session_secret),
            previous: config.session_secret_previous.as_ref().map(derive_key),
            secure: config.is_secure(),
        }
    }

    /// Whether a previous key is configured.
    #[must_use]
    pub const fn is_rotating(&self) -> bool {
        self.previous.is_some()
    }
}

/// 64-byte signing key from an arbitrary-length secret.
fn derive_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the signed-cookie session layer.
#[must_use]
pub fn create_session_layer(keys: &SessionKeys) -> StorefrontSessionLayer {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(keys.secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(keys.current.clone())
}

/// Re-sign session cookies that were signed with the previous key.
///
/// Must sit outside the session layer so the rewritten `Cookie` header is
/// what the session layer sees.
pub async fn session_key_rotation_middleware(
    State(keys): State<SessionKeys>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(previous) = keys.previous.as_ref() else {
        return next.run(request).await;
    };
    let Some((cookie_header, session_value)) =
        resign_session_cookie(request.headers(), &keys.current, previous)
    else {
        return next.run(request).await;
    };

    tracing::debug!("re-signed session cookie with current key");
    request.headers_mut().remove(COOKIE);
    request.headers_mut().insert(COOKIE, cookie_header);

    let mut response = next.run(request).await;

    let already_set = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&format!("{SESSION_COOKIE_NAME}=")));
    if !already_set {
        let cookie = Cookie::build((SESSION_COOKIE_NAME, session_value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(keys.secure)
            .max_age(Duration::seconds(SESSION_EXPIRY_SECONDS))
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Returns the rewritten `Cookie` header and the newly signed session value,
/// or `None` when there is nothing to rotate.
fn resign_session_cookie(
    headers: &HeaderMap,
    current: &Key,
    previous: &Key,
) -> Option<(HeaderValue, String)> {
    let mut jar = CookieJar::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for cookie in Cookie::split_parse(raw).flatten() {
            jar.add_original(cookie.into_owned());
        }
    }

    jar.get(SESSION_COOKIE_NAME)?;
    if jar.signed(current).get(SESSION_COOKIE_NAME).is_some() {
        return None;
    }
    let verified = jar.signed(previous).get(SESSION_COOKIE_NAME)?;

    jar.signed_mut(current)
        .add(Cookie::new(SESSION_COOKIE_NAME, verified.value().to_owned()));
    let session_value = jar.get(SESSION_COOKIE_NAME)?.value().to_owned();

    let header = jar
        .iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect::<Vec<_>>()
        .join("; ");
    HeaderValue::from_str(&header)
        .ok()
        .map(|value| (value, session_value))
}
