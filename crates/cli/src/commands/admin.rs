//! Admin helper commands.
//!
//! # Usage
//!
//! ```bash
//! # Hash a password for ADMIN_PASSWORD_HASH
//! echo -n 'correct horse battery staple' | th-cli admin hash-password
//! ```

use std::io::{BufRead, Write};

use tajine_house_storefront::services::auth;

use crate::error::CliError;

/// Shortest password accepted for an admin account.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Read one password line from `input` and print its argon2 PHC hash.
///
/// # Errors
///
/// Returns [`CliError::Input`] for an empty or short password and
/// [`CliError::PasswordHash`] if hashing fails.
pub fn hash_password(input: &mut impl BufRead, out: &mut impl Write) -> Result<(), CliError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CliError::Input(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let hash = auth::hash_password(password)?;
    writeln!(out, "{hash}")?;
    Ok(())
}
