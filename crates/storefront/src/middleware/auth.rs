//! Authentication extractors.
//!
//! Tokens arrive as `Authorization: Bearer <jwt>`. A token is only honoured
//! while its user still exists in the document.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::AccountSummary;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 `Unauthorized` when the token is missing, malformed or
/// expired, and with 401 `Invalid token` when its user has been deleted.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub AccountSummary);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::Unauthorized("Unauthorized".to_string());

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .ok_or_else(unauthorized)?;

        let claims = state.tokens().verify(token).map_err(|_| unauthorized())?;

        let user = state
            .store()
            .read(|doc| doc.find_user(&claims.sub).map(crate::models::User::summary))
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated administrator.
///
/// Runs [`RequireAuth`] first, then rejects non-admins with 403 `Forbidden`.
pub struct RequireAdmin(pub AccountSummary);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if user.role != hembit_core::UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(Self(user))
    }
}
