//! Password hashing and policy.
//!
//! New hashes are Argon2id PHC strings. Documents created before the move to
//! Argon2 carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those still verify and
//! are upgraded on the next successful sign-in.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
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

/// Verify a password against an Argon2 or legacy bcrypt hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password doesn't match or
/// the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    if is_legacy_hash(hash) {
        return match bcrypt::verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(AuthError::InvalidCredentials),
        };
    }

    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Whether `hash` is a bcrypt hash that should be replaced with Argon2.
#[must_use]
pub fn is_legacy_hash(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}
