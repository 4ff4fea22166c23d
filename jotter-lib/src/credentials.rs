//! Rules a profile name and password have to satisfy.
//!
//! The [`Store`](crate::Store) stores whatever it is given, so callers run these checks
//! before signing a profile up or binding a session to it.

use thiserror::Error;

use crate::Profile;

pub const MAX_NAME_LEN: usize = 10;
pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name is too long, at most {} characters are allowed", MAX_NAME_LEN)]
    NameTooLong,
    #[error("Password cannot be empty")]
    EmptyPassword,
    #[error("Password is too short, at least {} characters are required", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password is incorrect")]
    IncorrectPassword,
}

/// Check the fields of a signup form.
pub fn validate_signup(
    name: &str,
    password: &str,
    confirmation: &str,
) -> Result<(), CredentialError> {
    if name.is_empty() {
        return Err(CredentialError::EmptyName);
    }
    if password.is_empty() || confirmation.is_empty() {
        return Err(CredentialError::EmptyPassword);
    }
    // Only flagged as too short when both fields are, otherwise a mismatch is reported
    if password.chars().count() < MIN_PASSWORD_LEN
        && confirmation.chars().count() < MIN_PASSWORD_LEN
    {
        return Err(CredentialError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(CredentialError::PasswordMismatch);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CredentialError::NameTooLong);
    }

    Ok(())
}

/// Check a login attempt against the stored profile.
pub fn check_login(profile: &Profile, password: &str) -> Result<(), CredentialError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    if password != profile.password() {
        return Err(CredentialError::IncorrectPassword);
    }

    Ok(())
}
