//! Integration tests for accounts: signup, sign-in, profile, passwords and
//! saved addresses.
//!
//! Run with: cargo test -p hembit-integration-tests --test auth_flows

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use hembit_core::OtpPurpose;
use hembit_integration_tests::{TestApp, token_of};

const EMAIL: &str = "asha@example.com";
const PASSWORD: &str = "handloom-2024";

fn address() -> serde_json::Value {
    json!({
        "line1": "12 Weavers Lane",
        "line2": "",
        "city": "Jaipur",
        "state": "Rajasthan",
        "postalCode": "302001",
        "country": "India"
    })
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn test_signup_flow_creates_verified_customer() {
    let app = TestApp::spawn().await;

    let start = app
        .post(
            "/api/auth/signup/start",
            &json!({ "name": "Asha", "email": EMAIL, "password": PASSWORD }),
        )
        .await;
    assert_eq!(start.status, StatusCode::OK);
    assert_eq!(start.message(), "OTP sent to your email");

    let otp = app.pending_otp(EMAIL, OtpPurpose::Signup).unwrap();
    assert_eq!(otp.len(), 6);

    let verify = app
        .post("/api/auth/signup/verify", &json!({ "email": EMAIL, "otp": otp }))
        .await;
    assert_eq!(verify.status, StatusCode::OK);
    assert!(!token_of(&verify).is_empty());
    assert_eq!(verify.body["user"]["email"], EMAIL);
    assert_eq!(verify.body["user"]["role"], "customer");

    // The OTP is consumed
    assert!(app.pending_otp(EMAIL, OtpPurpose::Signup).is_none());
    let user = app
        .store()
        .read(|doc| doc.find_user_by_email(EMAIL).cloned())
        .unwrap();
    assert!(user.is_verified);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::spawn().await;

    let missing = app
        .post("/api/auth/signup/start", &json!({ "email": EMAIL }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "name, email, and password are required");

    let weak = app
        .post(
            "/api/auth/signup/start",
            &json!({ "name": "Asha", "email": EMAIL, "password": "short" }),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let taken = app
        .post(
            "/api/auth/signup/start",
            &json!({ "name": "Admin", "email": "ADMIN@hembit.in", "password": PASSWORD }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.message(), "Email is already registered");
}

#[tokio::test]
async fn test_signup_wrong_otp_is_rejected() {
    let app = TestApp::spawn().await;

    app.post(
        "/api/auth/signup/start",
        &json!({ "name": "Asha", "email": EMAIL, "password": PASSWORD }),
    )
    .await;

    let resp = app
        .post(
            "/api/auth/signup/verify",
            &json!({ "email": EMAIL, "otp": "000000" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.message(), "Invalid or expired OTP");
}

#[tokio::test]
async fn test_restarting_signup_replaces_the_otp() {
    let app = TestApp::spawn().await;
    let body = json!({ "name": "Asha", "email": EMAIL, "password": PASSWORD });

    app.post("/api/auth/signup/start", &body).await;
    app.post("/api/auth/signup/start", &body).await;

    let outstanding = app.store().read(|doc| {
        doc.otp_requests
            .iter()
            .filter(|r| r.is_for(EMAIL, OtpPurpose::Signup))
            .count()
    });
    assert_eq!(outstanding, 1);
}

// ============================================================================
// Sign-in & Session
// ============================================================================

#[tokio::test]
async fn test_signin_and_me() {
    let app = TestApp::spawn().await;
    app.signup_customer("Asha", EMAIL, PASSWORD).await;

    let signin = app
        .post(
            "/api/auth/signin",
            &json!({ "email": "  Asha@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(signin.status, StatusCode::OK);
    assert_eq!(signin.body["user"]["name"], "Asha");
    assert!(signin.body["user"]["addresses"].as_array().unwrap().is_empty());

    let token = token_of(&signin);
    let me = app.get_as(&token, "/api/auth/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], EMAIL);
    assert!(me.body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_signin_rejects_bad_credentials() {
    let app = TestApp::spawn().await;

    let missing = app.post("/api/auth/signin", &json!({ "email": EMAIL })).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "email and password are required");

    let wrong = app
        .post(
            "/api/auth/signin",
            &json!({ "email": "admin@hembit.in", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.message(), "Invalid credentials");
}

#[tokio::test]
async fn test_me_requires_a_valid_token() {
    let app = TestApp::spawn().await;

    let anonymous = app.get("/api/auth/me").await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.message(), "Unauthorized");

    let garbage = app.get_as("not-a-jwt", "/api/auth/me").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_invalid() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Asha", EMAIL, PASSWORD).await;

    app.store()
        .write(|doc| doc.users.retain(|u| u.email.as_str() != EMAIL))
        .unwrap();

    let resp = app.get_as(&token, "/api/auth/me").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.message(), "Invalid token");
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Asha", EMAIL, PASSWORD).await;

    let resp = app
        .put_as(
            &token,
            "/api/auth/profile",
            &json!({ "name": " Asha K ", "mobile": "9876543210", "age": "29" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.message(), "Profile updated");
    assert_eq!(resp.body["user"]["name"], "Asha K");
    assert_eq!(resp.body["user"]["mobile"], "9876543210");
    assert_eq!(resp.body["user"]["age"], 29);

    // Omitted fields are kept, explicit null clears the age
    let resp = app
        .put_as(&token, "/api/auth/profile", &json!({ "age": null }))
        .await;
    assert_eq!(resp.body["user"]["mobile"], "9876543210");
    assert!(resp.body["user"]["age"].is_null());

    let blank = app
        .put_as(&token, "/api/auth/profile", &json!({ "name": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.message(), "Name cannot be empty");
}

// ============================================================================
// Passwords
// ============================================================================

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Asha", EMAIL, PASSWORD).await;

    let wrong = app
        .put_as(
            &token,
            "/api/auth/password",
            &json!({ "currentPassword": "nope-nope", "newPassword": "new-password-1" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.message(), "Current password is incorrect");

    let ok = app
        .put_as(
            &token,
            "/api/auth/password",
            &json!({ "currentPassword": PASSWORD, "newPassword": "new-password-1" }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.message(), "Password updated successfully");

    app.sign_in(EMAIL, "new-password-1").await;
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::spawn().await;
    app.signup_customer("Asha", EMAIL, PASSWORD).await;

    let unknown = app
        .post(
            "/api/auth/password-reset/start",
            &json!({ "email": "nobody@example.com" }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let start = app
        .post("/api/auth/password-reset/start", &json!({ "email": EMAIL }))
        .await;
    assert_eq!(start.status, StatusCode::OK);
    assert_eq!(start.message(), "Password reset OTP sent to email");

    let otp = app.pending_otp(EMAIL, OtpPurpose::PasswordReset).unwrap();
    let verify = app
        .post(
            "/api/auth/password-reset/verify",
            &json!({ "email": EMAIL, "otp": otp, "newPassword": "reset-password-1" }),
        )
        .await;
    assert_eq!(verify.status, StatusCode::OK);

    app.sign_in(EMAIL, "reset-password-1").await;
    let old = app
        .post(
            "/api/auth/signin",
            &json!({ "email": EMAIL, "password": PASSWORD }),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Addresses
// ============================================================================

#[tokio::test]
async fn test_address_lifecycle() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Asha", EMAIL, PASSWORD).await;

    let incomplete = app
        .post_as(&token, "/api/auth/address", &json!({ "line1": "12 Weavers Lane" }))
        .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);
    assert_eq!(incomplete.message(), "Complete address is required");

    let added = app.post_as(&token, "/api/auth/address", &address()).await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.message(), "Address added");
    let id = added.body["address"]["id"].as_str().unwrap().to_owned();
    assert!(id.starts_with("addr_"));

    let updated = app
        .put_as(
            &token,
            &format!("/api/auth/address/{id}"),
            &json!({ "city": "Jodhpur" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["address"]["city"], "Jodhpur");
    assert_eq!(updated.body["address"]["line1"], "12 Weavers Lane");

    let me = app.get_as(&token, "/api/auth/me").await;
    assert_eq!(me.body["user"]["addresses"][0]["city"], "Jodhpur");

    let deleted = app
        .delete_as(&token, &format!("/api/auth/address/{id}"))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.message(), "Address deleted");

    let again = app
        .delete_as(&token, &format!("/api/auth/address/{id}"))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.message(), "Address not found");
}

#[tokio::test]
async fn test_address_accepts_loose_field_types() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Asha", EMAIL, PASSWORD).await;

    let added = app
        .post_as(
            &token,
            "/api/auth/address",
            &json!({
                "line1": "12 Weavers Lane",
                "line2": null,
                "city": "Jaipur",
                "state": "Rajasthan",
                "postalCode": 302_001,
                "country": "India"
            }),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["address"]["line2"], "");
    assert_eq!(added.body["address"]["postalCode"], "302001");
    let id = added.body["address"]["id"].as_str().unwrap().to_owned();

    let updated = app
        .put_as(
            &token,
            &format!("/api/auth/address/{id}"),
            &json!({ "line2": "Near Hawa Mahal", "postalCode": 302_002 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["address"]["postalCode"], "302002");

    // null clears an optional line; the rest are kept
    let cleared = app
        .put_as(
            &token,
            &format!("/api/auth/address/{id}"),
            &json!({ "line2": null }),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.body["address"]["line2"], "");
    assert_eq!(cleared.body["address"]["city"], "Jaipur");

    let blanked = app
        .put_as(
            &token,
            &format!("/api/auth/address/{id}"),
            &json!({ "city": null }),
        )
        .await;
    assert_eq!(blanked.status, StatusCode::BAD_REQUEST);
    assert_eq!(blanked.message(), "Complete address is required");
}
