//! SSO identity providers.
//!
//! The SSO routes only see the [`IdentityProvider`] trait. Two providers
//! exist:
//!
//! - [`SimulatedIdentityProvider`] - no external system; the authorization
//!   URL points straight back at the callback with a `simulated-` code.
//! - [`OAuthIdentityProvider`] - OAuth 2.0 authorization-code exchange
//!   against a configured token endpoint, then a userinfo lookup.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use tajine_house_core::Email;

use crate::config::SsoConfig;

const SIMULATED_CODE_PREFIX: &str = "simulated-";

/// Errors raised while talking to an identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The authorization code was rejected.
    #[error("invalid authorization code")]
    InvalidCode,

    /// The provider answered with something we cannot use.
    #[error("identity provider returned an unusable response: {0}")]
    InvalidResponse(String),

    /// Transport failure talking to the provider.
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A user as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable provider-side identifier.
    pub subject: String,
    /// Local username to find or provision.
    pub username: String,
    pub email: Option<Email>,
}

/// An SSO identity provider using the authorization-code flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Where to send the browser to start a login.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    fn authorization_url(&self, redirect_uri: &Url, state: &str) -> Result<Url, IdentityError>;

    /// Exchange the callback's `code` for the user's identity.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCode` if the provider rejects the code.
    async fn exchange_code(&self, code: &str, redirect_uri: &Url) -> Result<Identity, IdentityError>;
}

/// Random alphanumeric string, used for SSO state and simulated codes.
#[must_use]
pub fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

// =============================================================================
// Simulated provider
// =============================================================================

/// Identity provider that logs everyone in as one fixed user.
#[derive(Debug, Clone)]
pub struct SimulatedIdentityProvider {
    username: String,
}

impl SimulatedIdentityProvider {
    pub const DEFAULT_USERNAME: &'static str = "sso-admin";

    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl Default for SimulatedIdentityProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_USERNAME)
    }
}

#[async_trait]
impl IdentityProvider for SimulatedIdentityProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn authorization_url(&self, redirect_uri: &Url, state: &str) -> Result<Url, IdentityError> {
        let mut url = redirect_uri.clone();
        url.query_pairs_mut()
            .append_pair("code", &format!("{SIMULATED_CODE_PREFIX}{}", random_token(16)))
            .append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str, _redirect_uri: &Url) -> Result<Identity, IdentityError> {
        let Some(suffix) = code.strip_prefix(SIMULATED_CODE_PREFIX) else {
            return Err(IdentityError::InvalidCode);
        };
        if suffix.is_empty() {
            return Err(IdentityError::InvalidCode);
        }

        Ok(Identity {
            subject: format!("simulated:{}", self.username),
            username: self.username.clone(),
            email: None,
        })
    }
}

// =============================================================================
// OAuth provider
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl UserInfo {
    fn into_identity(self) -> Identity {
        let email = self.email.as_deref().and_then(|e| Email::parse(e).ok());
        let username = self
            .preferred_username
            .filter(|name| !name.trim().is_empty())
            .or_else(|| email.as_ref().map(|e| e.as_str().to_owned()))
            .unwrap_or_else(|| format!("sso-{}", self.sub));
        Identity {
            subject: self.sub,
            username,
            email,
        }
    }
}

/// OAuth 2.0 authorization-code provider.
pub struct OAuthIdentityProvider {
    client: reqwest::Client,
    config: SsoConfig,
}

impl OAuthIdentityProvider {
    /// Create a provider for the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SsoConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    fn name(&self) -> &'static str {
        "oauth"
    }

    fn authorization_url(&self, redirect_uri: &Url, state: &str) -> Result<Url, IdentityError> {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("scope", "openid profile email")
            .append_pair("state", state);
        Ok(url)
    }

    #[tracing::instrument(skip(self, code), fields(provider = "oauth"))]
    async fn exchange_code(&self, code: &str, redirect_uri: &Url) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .post(self.config.token_url.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(%status, "token endpoint rejected authorization code");
            return Err(IdentityError::InvalidCode);
        }
        if !status.is_success() {
            return Err(IdentityError::InvalidResponse(format!(
                "token endpoint returned {status}"
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        let response = self
            .client
            .get(self.config.userinfo_url.clone())
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IdentityError::InvalidResponse(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }
        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(info.into_identity())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn callback() -> Url {
        Url::parse("http://localhost:3000/api/auth/sso/callback").unwrap()
    }

    #[test]
    fn test_random_token() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(32));
    }

    #[tokio::test]
    async fn test_simulated_round_trip() {
        let provider = SimulatedIdentityProvider::default();
        let url = provider.authorization_url(&callback(), "abc123").unwrap();
        assert_eq!(url.path(), "/api/auth/sso/callback");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["state"], "abc123");
        assert!(pairs["code"].starts_with("simulated-"));

        let identity = provider.exchange_code(&pairs["code"], &callback()).await.unwrap();
        assert_eq!(identity.username, "sso-admin");
    }

    #[tokio::test]
    async fn test_simulated_rejects_foreign_codes() {
        let provider = SimulatedIdentityProvider::new("chef");
        assert!(matches!(
            provider.exchange_code("real-code", &callback()).await,
            Err(IdentityError::InvalidCode)
        ));
        assert!(matches!(
            provider.exchange_code("simulated-", &callback()).await,
            Err(IdentityError::InvalidCode)
        ));
    }

    #[test]
    fn test_oauth_authorization_url() {
        let provider = OAuthIdentityProvider::new(SsoConfig {
            client_id: "tajine".to_owned(),
            client_secret: SecretString::from("not-used-here"),
            authorize_url: Url::parse("https://id.example.com/authorize").unwrap(),
            token_url: Url::parse("https://id.example.com/token").unwrap(),
            userinfo_url: Url::parse("https://id.example.com/userinfo").unwrap(),
        })
        .unwrap();

        let url = provider.authorization_url(&callback(), "xyz").unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("id.example.com"));
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "tajine");
        assert_eq!(pairs["redirect_uri"], callback().as_str());
        assert_eq!(pairs["state"], "xyz");
    }

    #[test]
    fn test_userinfo_username_fallbacks() {
        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"1","preferred_username":"amina","email":"amina@riad.example"}"#,
        )
        .unwrap();
        assert_eq!(info.into_identity().username, "amina");

        let info: UserInfo =
            serde_json::from_str(r#"{"sub":"2","email":"omar@riad.example"}"#).unwrap();
        let identity = info.into_identity();
        assert_eq!(identity.username, "omar@riad.example");
        assert!(identity.email.is_some());

        let info: UserInfo = serde_json::from_str(r#"{"sub":"3","email":"bogus"}"#).unwrap();
        let identity = info.into_identity();
        assert_eq!(identity.username, "sso-3");
        assert!(identity.email.is_none());
    }
}
