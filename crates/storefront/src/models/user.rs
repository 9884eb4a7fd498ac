//! User domain types.

use tajine_house_core::{Email, UserId};

/// An admin account.
///
/// Never serialized: the password hash must not leave the server. Use
/// [`CurrentUser`](super::CurrentUser) for responses.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub email: Option<Email>,
    /// Identity provider subject for SSO accounts.
    pub sso_subject: Option<String>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("email", &self.email)
            .field("sso_subject", &self.sso_subject)
            .finish()
    }
}

/// Data for creating a user.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<Email>,
    pub sso_subject: Option<String>,
}
