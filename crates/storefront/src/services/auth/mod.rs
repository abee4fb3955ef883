//! Authentication service.
//!
//! Provides the signup and password-reset OTP flows, password sign-in and
//! password changes over the document store.

mod error;
mod password;
mod token;

pub use error::AuthError;
pub use password::{
    MIN_PASSWORD_LENGTH, hash_password, is_legacy_hash, validate_password, verify_password,
};
pub use token::{Claims, TOKEN_TTL_DAYS, TokenService};

use chrono::Utc;
use rand::Rng;
use secrecy::ExposeSecret;

use hembit_core::{Email, OtpPurpose, UserId, UserRole};

use crate::config::{ADMIN_NAME, DataConfig};
use crate::db::{AdminSeed, DocumentStore};
use crate::models::{Document, OtpPayload, OtpRequest, User};
use crate::services::email::EmailService;

/// The configured administrator, with its password hashed for seeding.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` if the admin email is malformed, or
/// `AuthError::PasswordHash` if hashing fails.
pub fn admin_seed(data: &DataConfig) -> Result<AdminSeed, AuthError> {
    Ok(AdminSeed {
        name: ADMIN_NAME.to_owned(),
        email: Email::parse(&data.admin_email)?,
        password_hash: hash_password(data.admin_password.expose_secret())?,
    })
}

/// Authentication service.
///
/// Borrows the store and mailer from application state for one request.
pub struct AuthService<'a> {
    store: &'a DocumentStore,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a DocumentStore, email: &'a EmailService) -> Self {
        Self { store, email }
    }

    // =========================================================================
    // Signup
    // =========================================================================

    /// Start a signup: hold the hashed password in an OTP request and email
    /// the code. Replaces any outstanding signup OTP for the address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn start_signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self
            .store
            .read(|doc| doc.find_user_by_email(email.as_str()).is_some())
        {
            return Err(AuthError::UserAlreadyExists);
        }

        let payload = OtpPayload::Signup {
            name: name.trim().to_owned(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
        };
        let code = self.issue_otp(&email, OtpPurpose::Signup, payload)?;

        self.email.send_signup_code(email.as_str(), &code).await?;
        tracing::info!(email = %email, "signup otp issued");
        Ok(())
    }

    /// Redeem a signup OTP, creating a verified customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOtp` unless a live matching signup OTP exists.
    /// Returns `AuthError::UserAlreadyExists` if the email was registered
    /// after the OTP was issued.
    pub fn verify_signup(&self, email: &str, otp: &str) -> Result<User, AuthError> {
        let now = Utc::now();
        let user = self.store.try_write(|doc| {
            let index = find_live_otp(doc, email, OtpPurpose::Signup, otp, now)?;
            let Some(OtpPayload::Signup {
                name,
                email,
                password_hash,
            }) = doc.otp_requests.get(index).map(|r| r.payload.clone())
            else {
                return Err(AuthError::InvalidOtp);
            };
            if doc.find_user_by_email(&email).is_some() {
                return Err(AuthError::UserAlreadyExists);
            }

            let user = User::new(name, Email::parse(&email)?, password_hash, UserRole::Customer);
            doc.otp_requests.remove(index);
            doc.users.push(user.clone());
            Ok(user)
        })?;

        tracing::info!(user_id = %user.id, "account created");
        Ok(user)
    }

    // =========================================================================
    // Sign-in
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// A legacy bcrypt hash is replaced with an Argon2 hash on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut user = self
            .store
            .read(|doc| doc.find_user_by_email(email).cloned())
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        if is_legacy_hash(&user.password_hash) {
            let upgraded = hash_password(password)?;
            user.password_hash.clone_from(&upgraded);
            self.store.write(|doc| {
                if let Some(stored) = doc.find_user_mut(&user.id) {
                    stored.password_hash = upgraded;
                }
            })?;
            tracing::debug!(user_id = %user.id, "upgraded legacy password hash");
        }

        Ok(user)
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    /// Email a password-reset code. Replaces any outstanding reset OTP.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    pub async fn start_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let user_id = self
            .store
            .read(|doc| doc.find_user_by_email(email).map(|u| u.id.clone()))
            .ok_or(AuthError::UserNotFound)?;
        let email = Email::parse(email)?;

        let payload = OtpPayload::PasswordReset { user_id };
        let code = self.issue_otp(&email, OtpPurpose::PasswordReset, payload)?;

        self.email.send_password_reset_code(email.as_str(), &code).await?;
        tracing::info!(email = %email, "password reset otp issued");
        Ok(())
    }

    /// Redeem a password-reset OTP and set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::InvalidOtp` unless a live matching reset OTP exists.
    pub fn complete_password_reset(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        let now = Utc::now();

        let user_id = self.store.try_write(|doc| {
            let index = find_live_otp(doc, email, OtpPurpose::PasswordReset, otp, now)?;
            let Some(OtpPayload::PasswordReset { user_id }) =
                doc.otp_requests.get(index).map(|r| r.payload.clone())
            else {
                return Err(AuthError::InvalidOtp);
            };

            doc.otp_requests.remove(index);
            if let Some(user) = doc.find_user_mut(&user_id) {
                user.password_hash = password_hash;
            }
            Ok(user_id)
        })?;

        tracing::info!(user_id = %user_id, "password reset");
        Ok(())
    }

    /// Change the password of a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if `current` is wrong.
    /// Returns `AuthError::WeakPassword` if `new` is too short.
    pub fn change_password(
        &self,
        user_id: &UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let stored_hash = self
            .store
            .read(|doc| doc.find_user(user_id).map(|u| u.password_hash.clone()))
            .ok_or(AuthError::UserNotFound)?;

        verify_password(current, &stored_hash).map_err(|_| AuthError::IncorrectPassword)?;
        validate_password(new)?;
        let password_hash = hash_password(new)?;

        self.store.try_write(|doc| {
            let user = doc.find_user_mut(user_id).ok_or(AuthError::UserNotFound)?;
            user.password_hash = password_hash;
            Ok::<_, AuthError>(())
        })?;

        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// Store a fresh OTP for `(email, purpose)`, dropping any earlier one.
    fn issue_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        payload: OtpPayload,
    ) -> Result<String, AuthError> {
        let code = generate_otp();
        let request = OtpRequest::issue(email.as_str(), purpose, code.clone(), payload, Utc::now());

        self.store.write(|doc| {
            doc.otp_requests
                .retain(|existing| !existing.is_for(email.as_str(), purpose));
            doc.otp_requests.push(request);
        })?;
        Ok(code)
    }
}

fn find_live_otp(
    doc: &Document,
    email: &str,
    purpose: OtpPurpose,
    code: &str,
    now: chrono::DateTime<Utc>,
) -> Result<usize, AuthError> {
    doc.otp_requests
        .iter()
        .position(|request| request.is_for(email, purpose) && request.accepts(code, now))
        .ok_or(AuthError::InvalidOtp)
}

/// Generate a 6-digit one-time code.
#[must_use]
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use crate::config::EmailConfig;
    use crate::db::{AdminSeed, StoreOptions};

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: DocumentStore,
        email: EmailService,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path: PathBuf = dir.path().join("data.json");
            std::fs::write(&path, "{}").unwrap();
            let admin = AdminSeed {
                name: "Admin".into(),
                email: Email::parse("admin@hembit.in").unwrap(),
                password_hash: hash_password("Admin@123").unwrap(),
            };
            let store = DocumentStore::open(StoreOptions::file(path, admin))
                .await
                .unwrap();
            let email = EmailService::new(&EmailConfig::default()).unwrap();
            Self {
                _dir: dir,
                store,
                email,
            }
        }

        fn auth(&self) -> AuthService<'_> {
            AuthService::new(&self.store, &self.email)
        }

        fn otp_for(&self, email: &str, purpose: OtpPurpose) -> String {
            self.store.read(|doc| {
                doc.otp_requests
                    .iter()
                    .find(|r| r.is_for(email, purpose))
                    .map(|r| r.otp.clone())
                    .unwrap()
            })
        }
    }

    #[test]
    fn test_generate_otp_format() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&value));
        }
    }

    #[tokio::test]
    async fn test_signup_flow() {
        let fx = Fixture::new().await;
        let auth = fx.auth();

        auth.start_signup("Asha", "Asha@Example.com", "kurta-lover")
            .await
            .unwrap();
        assert!(matches!(
            auth.verify_signup("asha@example.com", "000000"),
            Err(AuthError::InvalidOtp)
        ));

        let code = fx.otp_for("asha@example.com", OtpPurpose::Signup);
        let user = auth.verify_signup("asha@example.com", &code).unwrap();
        assert_eq!(user.role, UserRole::Customer);
        assert!(user.is_verified);

        // The code is consumed.
        assert!(auth.verify_signup("asha@example.com", &code).is_err());
        assert!(auth.sign_in("ASHA@example.com", "kurta-lover").is_ok());
        fx.store.close().await;
    }

    #[tokio::test]
    async fn test_restarting_signup_replaces_otp() {
        let fx = Fixture::new().await;
        let auth = fx.auth();

        auth.start_signup("A", "a@example.com", "password-1").await.unwrap();
        auth.start_signup("A", "a@example.com", "password-2").await.unwrap();

        let count = fx.store.read(|doc| doc.otp_requests.len());
        assert_eq!(count, 1);
        fx.store.close().await;
    }

    #[tokio::test]
    async fn test_signup_rejects_existing_email() {
        let fx = Fixture::new().await;
        let result = fx
            .auth()
            .start_signup("Admin", "ADMIN@hembit.in", "whatever-pass")
            .await;
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
        fx.store.close().await;
    }

    #[tokio::test]
    async fn test_sign_in_rejects_wrong_password() {
        let fx = Fixture::new().await;
        let auth = fx.auth();
        assert!(auth.sign_in("admin@hembit.in", "Admin@123").is_ok());
        assert!(matches!(
            auth.sign_in("admin@hembit.in", "nope"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("ghost@hembit.in", "Admin@123"),
            Err(AuthError::InvalidCredentials)
        ));
        fx.store.close().await;
    }

    #[tokio::test]
    async fn test_legacy_hash_is_upgraded() {
        let fx = Fixture::new().await;
        let legacy = bcrypt::hash("old-password", 4).unwrap();
        fx.store
            .write(|doc| doc.users[0].password_hash = legacy)
            .unwrap();

        let user = fx.auth().sign_in("admin@hembit.in", "old-password").unwrap();
        assert!(!is_legacy_hash(&user.password_hash));
        let stored = fx.store.read(|doc| doc.users[0].password_hash.clone());
        assert!(stored.starts_with("$argon2"));
        fx.store.close().await;
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let fx = Fixture::new().await;
        let auth = fx.auth();

        assert!(matches!(
            auth.start_password_reset("ghost@hembit.in").await,
            Err(AuthError::UserNotFound)
        ));

        auth.start_password_reset("admin@hembit.in").await.unwrap();
        let code = fx.otp_for("admin@hembit.in", OtpPurpose::PasswordReset);
        auth.complete_password_reset("admin@hembit.in", &code, "brand-new-pass")
            .unwrap();

        assert!(auth.sign_in("admin@hembit.in", "brand-new-pass").is_ok());
        assert!(matches!(
            auth.complete_password_reset("admin@hembit.in", &code, "another-pass"),
            Err(AuthError::InvalidOtp)
        ));
        fx.store.close().await;
    }

    #[tokio::test]
    async fn test_change_password() {
        let fx = Fixture::new().await;
        let auth = fx.auth();
        let id = fx.store.read(|doc| doc.users[0].id.clone());

        assert!(matches!(
            auth.change_password(&id, "wrong", "new-password"),
            Err(AuthError::IncorrectPassword)
        ));
        assert!(matches!(
            auth.change_password(&id, "Admin@123", "short"),
            Err(AuthError::WeakPassword(_))
        ));
        auth.change_password(&id, "Admin@123", "new-password").unwrap();
        assert!(auth.sign_in("admin@hembit.in", "new-password").is_ok());
        fx.store.close().await;
    }
}
