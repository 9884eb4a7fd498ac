//! Authentication service.
//!
//! Provides argon2 password login and SSO user provisioning.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::db::{RepositoryError, Storage};
use crate::models::{NewUser, User};
use crate::services::identity::Identity;

/// Stored in place of a hash for SSO-only accounts. Never parses as a PHC
/// string, so no password can match it.
pub const UNUSABLE_PASSWORD: &str = "!sso";

/// Verified against when the username is unknown, so both failure paths
/// pay for one argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("tajine-house-dummy-password").ok());

/// Authentication service.
///
/// Handles password login, admin bootstrap and SSO provisioning.
pub struct AuthService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self.storage.get_user_by_username(username.trim()).await?;
        match user {
            Some(user) if user.password_hash != UNUSABLE_PASSWORD => {
                verify_password(password, &user.password_hash)?;
                Ok(user)
            }
            // Unknown users and SSO-only accounts cost the same as a wrong password.
            _ => {
                if let Some(dummy) = DUMMY_HASH.as_deref() {
                    let _ = verify_password(password, dummy);
                }
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Create the user with this password hash unless the username exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn ensure_user(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
        if let Some(existing) = self.storage.get_user_by_username(username).await? {
            tracing::debug!(username, "user already present");
            return Ok(existing);
        }

        let user = self
            .storage
            .create_user(NewUser {
                username: username.to_owned(),
                password_hash: password_hash.to_owned(),
                email: None,
                sso_subject: None,
            })
            .await?;
        tracing::info!(user_id = %user.id, username, "created user");
        Ok(user)
    }

    /// Find the user bound to an SSO identity, creating it on first login.
    ///
    /// Accounts are matched by provider subject only. When the preferred
    /// username already belongs to another account the new one is named
    /// `sso-<subject>` instead.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn find_or_provision(&self, identity: &Identity) -> Result<User, AuthError> {
        if let Some(user) = self.storage.get_user_by_sso_subject(&identity.subject).await? {
            return Ok(user);
        }

        let username = if self
            .storage
            .get_user_by_username(&identity.username)
            .await?
            .is_some()
        {
            tracing::warn!(
                username = %identity.username,
                subject = %identity.subject,
                "SSO username taken by another account"
            );
            format!("sso-{}", identity.subject)
        } else {
            identity.username.clone()
        };

        let created = self
            .storage
            .create_user(NewUser {
                username,
                password_hash: UNUSABLE_PASSWORD.to_owned(),
                email: identity.email.clone(),
                sso_subject: Some(identity.subject.clone()),
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "provisioned SSO user");
                Ok(user)
            }
            // Lost a race with a concurrent first login for the same subject.
            Err(RepositoryError::Conflict(reason)) => self
                .storage
                .get_user_by_sso_subject(&identity.subject)
                .await?
                .ok_or(AuthError::Repository(RepositoryError::Conflict(reason))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or does
/// not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();
    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
