//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;

use tajine_house_core::pricing::PricingPolicy;

use crate::config::StorefrontConfig;
use crate::db::{MemoryStorage, RepositoryError, Storage, seed};
use crate::middleware::SessionKeys;
use crate::services::auth::{AuthError, AuthService};
use crate::services::identity::{
    IdentityError, IdentityProvider, OAuthIdentityProvider, SimulatedIdentityProvider,
};

/// Error building or bootstrapping the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("identity provider: {0}")]
    Identity(#[from] IdentityError),
    #[error("seeding menu: {0}")]
    Repository(#[from] RepositoryError),
    #[error("creating admin user: {0}")]
    Auth(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the identity provider and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityProvider>,
    session_keys: SessionKeys,
}

impl AppState {
    /// Create state with an empty in-memory store and the configured
    /// identity provider (OAuth when SSO is configured, simulated otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the OAuth HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let identity: Arc<dyn IdentityProvider> = match &config.sso {
            Some(sso) => Arc::new(OAuthIdentityProvider::new(sso.clone())?),
            None => Arc::new(SimulatedIdentityProvider::default()),
        };
        Ok(Self::with_parts(config, Arc::new(MemoryStorage::new()), identity))
    }

    /// Create state from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let session_keys = SessionKeys::from_config(&config);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                identity,
                session_keys,
            }),
        }
    }

    /// Seed the sample menu and create the configured admin user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the seed data.
    pub async fn bootstrap(&self) -> Result<(), StateError> {
        let config = self.config();
        if config.seed_menu {
            seed::seed_menu(self.storage()).await?;
        }

        match &config.admin.password_hash {
            Some(hash) => {
                AuthService::new(self.storage())
                    .ensure_user(&config.admin.username, hash.expose_secret())
                    .await?;
            }
            None => tracing::warn!(
                "STOREFRONT_ADMIN_PASSWORD_HASH not set; password login is disabled"
            ),
        }

        tracing::info!(identity_provider = self.identity().name(), "state bootstrapped");
        Ok(())
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The order/menu/user store.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.inner.storage.as_ref()
    }

    /// The SSO identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Cookie signing keys.
    #[must_use]
    pub fn session_keys(&self) -> &SessionKeys {
        &self.inner.session_keys
    }

    /// Fee and minimum-order policy.
    #[must_use]
    pub fn pricing(&self) -> PricingPolicy {
        self.inner.config.pricing
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use crate::services::auth::hash_password;

    fn config() -> StorefrontConfig {
        StorefrontConfig::with_defaults(
            Url::parse("http://localhost:3000").unwrap(),
            SecretString::from("k7#Qm2$vL9!pX4&nR8@wT3^yB6*cF1zH"),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_without_admin_hash() {
        let state = AppState::new(config()).unwrap();
        state.bootstrap().await.unwrap();
        assert_eq!(state.storage().list_categories().await.unwrap().len(), 4);
        assert!(
            state
                .storage()
                .get_user_by_username("admin")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(state.identity().name(), "simulated");
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin_once() {
        let mut config = config();
        config.seed_menu = false;
        config.admin.password_hash = Some(SecretString::from(hash_password("harissa").unwrap()));
        let state = AppState::new(config).unwrap();

        state.bootstrap().await.unwrap();
        state.bootstrap().await.unwrap();

        assert!(state.storage().list_categories().await.unwrap().is_empty());
        let admin = AuthService::new(state.storage())
            .login("admin", "harissa")
            .await
            .unwrap();
        assert_eq!(admin.username, "admin");
    }
}
