//! Signed bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use hembit_core::{UserId, UserRole};

use super::AuthError;
use crate::models::User;

/// How long an issued token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims carried by a storefront token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID.
    pub sub: UserId,
    pub role: UserRole,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service keyed with `secret`.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            email: user.email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Check the signature and expiry of `token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hembit_core::Email;

    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_owned()))
    }

    fn user() -> User {
        User::new(
            "Asha".into(),
            Email::parse("asha@example.com").unwrap(),
            "hash".into(),
            UserRole::Customer,
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("k3Y!9xQ#mP2@vL7$wR4%zT8^nB1&cF6*");
        let user = user();
        let claims = tokens.verify(&tokens.issue(&user).unwrap()).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Customer);
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = service("first-key-aaaaaaaaaaaaaaaaaaaaaaaaa")
            .issue(&user())
            .unwrap();
        let result = service("second-key-bbbbbbbbbbbbbbbbbbbbbbbb").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let tokens = service("k3Y!9xQ#mP2@vL7$wR4%zT8^nB1&cF6*");
        assert!(matches!(tokens.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
