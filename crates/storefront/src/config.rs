//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_SESSION_SECRET_PREVIOUS` - Previous session secret, still accepted during rotation
//! - `STOREFRONT_ADMIN_USERNAME` - Admin login name (default: admin)
//! - `STOREFRONT_ADMIN_PASSWORD_HASH` - Argon2 hash of the admin password (`th-cli admin hash-password`)
//! - `STOREFRONT_DELIVERY_FEE_RATE` - Delivery fee as a fraction of the subtotal (default: 0.07)
//! - `STOREFRONT_MINIMUM_ORDER` - Minimum order subtotal (default: 80)
//! - `STOREFRONT_SEED_MENU` - Load the sample menu on startup (default: true)
//! - `STOREFRONT_TRUST_PROXY` - Key the login rate limit on `X-Forwarded-For`/`X-Real-IP`
//!   instead of the peer address; only set behind a proxy that overwrites them (default: false)
//! - `SSO_CLIENT_ID`, `SSO_CLIENT_SECRET`, `SSO_AUTHORIZE_URL`, `SSO_TOKEN_URL`,
//!   `SSO_USERINFO_URL` - OAuth identity provider; all or none
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use tajine_house_core::pricing::PricingPolicy;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

const SSO_VARS: [&str; 5] = [
    "SSO_CLIENT_ID",
    "SSO_CLIENT_SECRET",
    "SSO_AUTHORIZE_URL",
    "SSO_TOKEN_URL",
    "SSO_USERINFO_URL",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Secret that signed sessions before the last rotation
    pub session_secret_previous: Option<SecretString>,
    /// Bootstrap admin account
    pub admin: AdminConfig,
    /// Delivery fee and minimum order
    pub pricing: PricingPolicy,
    /// Load the sample menu into an empty store
    pub seed_menu: bool,
    /// Take the client IP from forwarding headers set by a reverse proxy
    pub trust_proxy: bool,
    /// OAuth identity provider; `None` selects the simulated provider
    pub sso: Option<SsoConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Admin account created on startup.
///
/// Implements `Debug` manually to redact the password hash.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2 PHC string; without it password login is disabled.
    pub password_hash: Option<SecretString>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// OAuth authorization-code provider settings.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct SsoConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub authorize_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
}

impl std::fmt::Debug for SsoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("userinfo_url", &self.userinfo_url.as_str())
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("STOREFRONT_PORT", "3000")?;
        let base_url = parse_url("STOREFRONT_BASE_URL", &get_required_env("STOREFRONT_BASE_URL")?)?;

        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;
        let session_secret_previous = match get_optional_env("STOREFRONT_SESSION_SECRET_PREVIOUS") {
            Some(value) => {
                let secret = SecretString::from(value);
                validate_session_secret(&secret, "STOREFRONT_SESSION_SECRET_PREVIOUS")?;
                Some(secret)
            }
            None => None,
        };

        let admin = AdminConfig::from_env()?;
        let pricing = pricing_from_env()?;
        let seed_menu = parse_env_or_default("STOREFRONT_SEED_MENU", "true")?;
        let trust_proxy = parse_env_or_default("STOREFRONT_TRUST_PROXY", "false")?;
        let sso = SsoConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            session_secret_previous,
            admin,
            pricing,
            seed_menu,
            trust_proxy,
            sso,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with every optional setting at its default.
    ///
    /// Used by embedders and tests that assemble the app without an
    /// environment.
    #[must_use]
    pub fn with_defaults(base_url: Url, session_secret: SecretString) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url,
            session_secret,
            session_secret_previous: None,
            admin: AdminConfig {
                username: "admin".to_owned(),
                password_hash: None,
            },
            pricing: PricingPolicy::default(),
            seed_menu: true,
            trust_proxy: false,
            sso: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Absolute URL for a path on this storefront.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be joined onto the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let password_hash = match get_optional_env("STOREFRONT_ADMIN_PASSWORD_HASH") {
            Some(hash) => {
                argon2::PasswordHash::new(&hash).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "STOREFRONT_ADMIN_PASSWORD_HASH".to_string(),
                        format!("not a password hash: {e}"),
                    )
                })?;
                Some(SecretString::from(hash))
            }
            None => None,
        };

        Ok(Self {
            username: get_env_or_default("STOREFRONT_ADMIN_USERNAME", "admin"),
            password_hash,
        })
    }
}

impl SsoConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let present: Vec<&str> = SSO_VARS
            .iter()
            .copied()
            .filter(|key| std::env::var(key).is_ok())
            .collect();
        if present.is_empty() {
            return Ok(None);
        }
        if let Some(missing) = SSO_VARS.iter().find(|key| !present.contains(*key)) {
            return Err(ConfigError::MissingEnvVar(format!(
                "{missing} (SSO needs all of {})",
                SSO_VARS.join(", ")
            )));
        }

        Ok(Some(Self {
            client_id: get_required_env("SSO_CLIENT_ID")?,
            client_secret: get_validated_secret("SSO_CLIENT_SECRET")?,
            authorize_url: parse_url("SSO_AUTHORIZE_URL", &get_required_env("SSO_AUTHORIZE_URL")?)?,
            token_url: parse_url("SSO_TOKEN_URL", &get_required_env("SSO_TOKEN_URL")?)?,
            userinfo_url: parse_url("SSO_USERINFO_URL", &get_required_env("SSO_USERINFO_URL")?)?,
        }))
    }
}

fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let rate: Decimal = parse_env_or_default("STOREFRONT_DELIVERY_FEE_RATE", "0.07")?;
    let minimum: Decimal = parse_env_or_default("STOREFRONT_MINIMUM_ORDER", "80")?;
    validate_pricing(rate, minimum)?;
    Ok(PricingPolicy::new(rate, minimum))
}

fn validate_pricing(rate: Decimal, minimum: Decimal) -> Result<(), ConfigError> {
    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_DELIVERY_FEE_RATE".to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    if minimum.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_MINIMUM_ORDER".to_string(),
            format!("cannot be negative (got {minimum})"),
        ));
    }
    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be an http(s) URL (got {})", url.scheme()),
        ));
    }
    Ok(url)
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig::with_defaults(
            Url::parse("http://localhost:3000").unwrap(),
            SecretString::from("x".repeat(32)),
        )
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "TEST_SESSION").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_validate_pricing() {
        assert!(validate_pricing(Decimal::new(7, 2), Decimal::from(80)).is_ok());
        assert!(validate_pricing(Decimal::new(15, 1), Decimal::from(80)).is_err());
        assert!(validate_pricing(Decimal::new(7, 2), Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_parse_url_requires_http() {
        assert!(parse_url("TEST_URL", "https://tajine.example").is_ok());
        assert!(parse_url("TEST_URL", "ftp://tajine.example").is_err());
        assert!(parse_url("TEST_URL", "not a url").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
        assert_eq!(config.pricing, PricingPolicy::default());
        assert_eq!(
            config.url_for("/api/auth/sso/callback").unwrap().as_str(),
            "http://localhost:3000/api/auth/sso/callback"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let sso = SsoConfig {
            client_id: "tajine-client".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
            authorize_url: Url::parse("https://id.example/authorize").unwrap(),
            token_url: Url::parse("https://id.example/token").unwrap(),
            userinfo_url: Url::parse("https://id.example/userinfo").unwrap(),
        };
        let admin = AdminConfig {
            username: "chef".to_string(),
            password_hash: Some(SecretString::from("$argon2id$v=19$abc")),
        };

        let debug_output = format!("{sso:?} {admin:?}");
        assert!(debug_output.contains("tajine-client"));
        assert!(debug_output.contains("chef"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
        assert!(!debug_output.contains("argon2id"));
    }
}
