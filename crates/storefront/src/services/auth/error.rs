//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::services::email::EmailError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] hembit_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The current password supplied for a password change is wrong.
    #[error("current password is incorrect")]
    IncorrectPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// No live OTP matches the submitted code.
    #[error("invalid or expired otp")]
    InvalidOtp,

    /// Bearer token missing, malformed, expired or badly signed.
    #[error("invalid token")]
    InvalidToken,

    /// Token could not be signed.
    #[error("token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The verification email could not be delivered.
    #[error("email error: {0}")]
    Email(#[from] EmailError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
