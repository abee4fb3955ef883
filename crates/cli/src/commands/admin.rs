//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin, or promote an existing customer
//! hembit-cli admin create -e ops@hembit.in -n "Ops" -p 'a-long-password'
//!
//! # Reset any account's password
//! hembit-cli admin reset-password -e ops@hembit.in -p 'another-password'
//! ```

use thiserror::Error;

use hembit_core::{Email, UserRole};
use hembit_storefront::db::StoreError;
use hembit_storefront::models::User;
use hembit_storefront::services::auth::{AuthError, hash_password, validate_password};

use super::{Access, OpenError, open_store};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Empty display name.
    #[error("Name cannot be empty")]
    EmptyName,

    /// No account has this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What `create_user` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Promoted,
    AlreadyAdmin,
}

/// Create an admin user, or promote the account that already has `email`.
///
/// An existing account keeps its password; use `reset-password` to change it.
///
/// # Errors
///
/// Returns `AdminError` if the input is invalid or the store fails.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
) -> Result<CreateOutcome, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::EmptyName);
    }
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let store = open_store(Access::Update).await?;
    let result = store.write(|doc| {
        if let Some(existing) = doc
            .users
            .iter_mut()
            .find(|u| u.email.normalized() == email.normalized())
        {
            if existing.is_admin() {
                return CreateOutcome::AlreadyAdmin;
            }
            existing.role = UserRole::Admin;
            existing.is_verified = true;
            return CreateOutcome::Promoted;
        }

        doc.users.push(User::new(
            name.to_owned(),
            email.clone(),
            password_hash,
            UserRole::Admin,
        ));
        CreateOutcome::Created
    });
    store.close().await;

    let outcome = result?;
    match outcome {
        CreateOutcome::Created => tracing::info!(email = %email, "Admin user created"),
        CreateOutcome::Promoted => tracing::info!(email = %email, "Existing user promoted to admin"),
        CreateOutcome::AlreadyAdmin => tracing::warn!(email = %email, "User is already an admin"),
    }
    Ok(outcome)
}

/// Replace the password of the account with `email`.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has that email.
pub async fn reset_password(email: &str, password: &str) -> Result<(), AdminError> {
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let store = open_store(Access::Update).await?;
    let result = store.try_write(|doc| {
        let id = doc
            .find_user_by_email(email)
            .map(|u| u.id.clone())
            .ok_or_else(|| AdminError::UserNotFound(email.to_owned()))?;
        if let Some(user) = doc.find_user_mut(&id) {
            user.password_hash = password_hash;
        }
        Ok::<_, AdminError>(())
    });
    store.close().await;

    result?;
    tracing::info!(email = %email, "Password reset");
    Ok(())
}
