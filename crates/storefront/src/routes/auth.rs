//! Account route handlers.
//!
//! Signup and password reset are two-step flows: `start` emails a six-digit
//! code, `verify` redeems it. Sessions are stateless bearer tokens.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use hembit_core::AddressId;

use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{AccountSummary, PostalAddress, Profile, SavedAddress, User, lenient};
use crate::routes::{all_present, non_blank};
use crate::state::AppState;

/// Create the auth routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup/start", post(signup_start))
        .route("/signup/verify", post(signup_verify))
        .route("/signin", post(signin))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/password-reset/start", post(password_reset_start))
        .route("/password-reset/verify", post(password_reset_verify))
        .route("/address", post(add_address))
        .route("/address/{id}", put(update_address).delete(delete_address))
}

/// Plain `{message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// =============================================================================
// Signup
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupStartRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Start a signup by emailing a verification code.
#[instrument(skip(state, request))]
pub async fn signup_start(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupStartRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some([name, email]), Some(password)) = (
        all_present([request.name.as_ref(), request.email.as_ref()]),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request(
            "name, email, and password are required",
        ));
    };

    state.auth().start_signup(name, email, password).await?;

    Ok(MessageResponse::new("OTP sent to your email"))
}

#[derive(Debug, Deserialize)]
pub struct SignupVerifyRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

/// Token plus the caller's identity.
#[derive(Debug, Serialize)]
pub struct SessionResponse<U> {
    pub token: String,
    pub user: U,
}

/// Redeem a signup code and sign the new customer in.
#[instrument(skip(state, request))]
pub async fn signup_verify(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupVerifyRequest>,
) -> Result<Json<SessionResponse<AccountSummary>>> {
    let [email, otp] = all_present([request.email.as_ref(), request.otp.as_ref()])
        .ok_or_else(|| AppError::bad_request("email and otp are required"))?;

    let user = state.auth().verify_signup(email, otp)?;
    let token = state.tokens().issue(&user)?;
    add_breadcrumb("auth", "Signup verified", Some(&[("user_id", user.id.as_str())]));

    Ok(Json(SessionResponse {
        token,
        user: user.summary(),
    }))
}

// =============================================================================
// Sign-in
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Identity returned at sign-in, with saved addresses for checkout.
#[derive(Debug, Serialize)]
pub struct SignedInUser {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub addresses: Vec<SavedAddress>,
}

impl From<User> for SignedInUser {
    fn from(user: User) -> Self {
        Self {
            account: user.summary(),
            addresses: user.addresses,
        }
    }
}

/// Password sign-in.
#[instrument(skip(state, request))]
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SigninRequest>,
) -> Result<Json<SessionResponse<SignedInUser>>> {
    let (Some(email), Some(password)) = (
        non_blank(request.email.as_ref()),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request("email and password are required"));
    };

    let user = state.auth().sign_in(email, password)?;
    let token = state.tokens().issue(&user)?;
    tracing::info!(user_id = %user.id, "signed in");

    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: Profile,
}

/// The caller's full profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .store()
        .read(|doc| doc.find_user(&user.id).map(User::profile))
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
    Ok(Json(ProfileResponse { user: profile }))
}

/// Profile fields to change. Absent fields are left alone; `age: null`
/// clears the age.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::present")]
    pub age: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub user: Profile,
}

/// Update the caller's profile.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdatedResponse>> {
    let name = match request.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("Name cannot be empty")),
        other => other.map(str::to_owned),
    };

    let profile = state.store().try_write(|doc| {
        let stored = doc
            .find_user_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(name) = name {
            stored.name = name;
        }
        for (field, value) in [
            (&mut stored.mobile, request.mobile),
            (&mut stored.country, request.country),
            (&mut stored.pincode, request.pincode),
            (&mut stored.gender, request.gender),
        ] {
            if let Some(value) = value {
                *field = value.trim().to_owned();
            }
        }
        if let Some(age) = &request.age {
            stored.age = lenient::value_as_u32(age);
        }
        Ok::<_, AppError>(stored.profile())
    })?;

    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated".to_string(),
        user: profile,
    }))
}

// =============================================================================
// Passwords
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Change the caller's password.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some(current), Some(new)) = (
        request.current_password.as_deref().filter(|p| !p.is_empty()),
        request.new_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request(
            "currentPassword and newPassword are required",
        ));
    };

    state.auth().change_password(&user.id, current, new)?;
    Ok(MessageResponse::new("Password updated successfully"))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetStartRequest {
    pub email: Option<String>,
}

/// Email a password-reset code.
#[instrument(skip(state, request))]
pub async fn password_reset_start(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasswordResetStartRequest>,
) -> Result<Json<MessageResponse>> {
    let email = non_blank(request.email.as_ref())
        .ok_or_else(|| AppError::bad_request("email is required"))?;

    state.auth().start_password_reset(email).await?;
    Ok(MessageResponse::new("Password reset OTP sent to email"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetVerifyRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

/// Redeem a password-reset code and set the new password.
#[instrument(skip(state, request))]
pub async fn password_reset_verify(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasswordResetVerifyRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some([email, otp]), Some(new_password)) = (
        all_present([request.email.as_ref(), request.otp.as_ref()]),
        request.new_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request(
            "email, otp, and newPassword are required",
        ));
    };

    state
        .auth()
        .complete_password_reset(email, otp, new_password)?;
    Ok(MessageResponse::new("Password updated successfully"))
}

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub message: String,
    pub address: SavedAddress,
}

/// Save a new address to the caller's account.
#[instrument(skip(state, user, address), fields(user_id = %user.id))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(address): ApiJson<PostalAddress>,
) -> Result<Json<AddressResponse>> {
    if !address.is_complete() {
        return Err(AppError::bad_request("Complete address is required"));
    }

    let saved = SavedAddress {
        id: AddressId::generate(),
        address,
    };
    state.store().try_write(|doc| {
        let stored = doc
            .find_user_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        stored.addresses.push(saved.clone());
        Ok::<_, AppError>(())
    })?;

    Ok(Json(AddressResponse {
        message: "Address added".to_string(),
        address: saved,
    }))
}

/// Address fields to change. Absent fields keep their saved values; `null`
/// clears one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressPatch {
    #[serde(deserialize_with = "lenient::patch_text")]
    pub line1: Option<String>,
    #[serde(deserialize_with = "lenient::patch_text")]
    pub line2: Option<String>,
    #[serde(deserialize_with = "lenient::patch_text")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient::patch_text")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::patch_text")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "lenient::patch_text")]
    pub country: Option<String>,
}

impl AddressPatch {
    fn apply(self, address: &mut PostalAddress) {
        for (field, value) in [
            (&mut address.line1, self.line1),
            (&mut address.line2, self.line2),
            (&mut address.city, self.city),
            (&mut address.state, self.state),
            (&mut address.postal_code, self.postal_code),
            (&mut address.country, self.country),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// Edit one of the caller's saved addresses.
#[instrument(skip(state, user, patch), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    ApiJson(patch): ApiJson<AddressPatch>,
) -> Result<Json<AddressResponse>> {
    let saved = state.store().try_write(|doc| {
        let saved = doc
            .find_user_mut(&user.id)
            .and_then(|u| u.addresses.iter_mut().find(|a| a.id == id))
            .ok_or_else(|| AppError::not_found("Address not found"))?;

        let mut updated = saved.address.clone();
        patch.apply(&mut updated);
        if !updated.is_complete() {
            return Err(AppError::bad_request("Complete address is required"));
        }
        saved.address = updated;
        Ok(saved.clone())
    })?;

    Ok(Json(AddressResponse {
        message: "Address updated".to_string(),
        address: saved,
    }))
}

/// Remove one of the caller's saved addresses.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    state.store().try_write(|doc| {
        let addresses = &mut doc
            .find_user_mut(&user.id)
            .ok_or_else(|| AppError::not_found("Address not found"))?
            .addresses;
        let before = addresses.len();
        addresses.retain(|a| a.id != id);
        if addresses.len() == before {
            return Err(AppError::not_found("Address not found"));
        }
        Ok(())
    })?;

    Ok(MessageResponse::new("Address deleted"))
}
