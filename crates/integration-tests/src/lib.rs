//! Integration tests for the HEMBIT storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hembit-integration-tests
//! ```
//!
//! Every test drives the real router in-process against a file-mode store
//! living in its own temporary directory, seeded from the shipped
//! `crates/storefront/data/data.json`. No server, database or network is
//! needed; email runs in log mode.
//!
//! # Test Categories
//!
//! - `public_catalog` - Unauthenticated storefront endpoints
//! - `auth_flows` - Signup, sign-in, profile, addresses, password reset
//! - `checkout` - Orders, payment confirmation and tracking
//! - `admin_catalog` - Admin catalog, content, orders and media
//! - `admin_mail` - Recipients, broadcasts and the newsletter
//! - `persistence` - Writes reaching disk and surviving a restart

#![allow(clippy::missing_panics_doc)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hembit_core::OtpPurpose;
use hembit_storefront::config::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, StorefrontConfig};
use hembit_storefront::db::{DocumentStore, StoreOptions};
use hembit_storefront::middleware::RateLimits;
use hembit_storefront::routes;
use hembit_storefront::services::auth::admin_seed;
use hembit_storefront::state::AppState;

/// The seed document shipped with the storefront.
#[must_use]
pub fn seed_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../storefront/data/data.json")
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of the body, or `""`.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// An in-process storefront over a temporary file-mode store.
pub struct TestApp {
    router: Router,
    store: Arc<DocumentStore>,
    dir: TempDir,
}

impl TestApp {
    /// Start an app over a copy of the shipped seed document.
    pub async fn spawn() -> Self {
        let seed = std::fs::read(seed_path()).expect("Failed to read seed document");
        Self::from_seed_bytes(&seed).await
    }

    /// Start an app over an arbitrary document.
    pub async fn with_document(document: &Value) -> Self {
        let bytes = serde_json::to_vec(document).expect("Failed to serialize document");
        Self::from_seed_bytes(&bytes).await
    }

    async fn from_seed_bytes(seed: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = dir.path().join("data.json");
        std::fs::write(&data_path, seed).expect("Failed to write seed document");

        let (router, store) = start(&dir).await;
        Self { router, store, dir }
    }

    /// Flush the store, then start a fresh app over the same directory.
    pub async fn restart(self) -> Self {
        self.store.close().await;
        let (router, store) = start(&self.dir).await;
        Self {
            router,
            store,
            dir: self.dir,
        }
    }

    /// The live document store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Path of the persisted document.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("data.json")
    }

    /// Directory uploads are written to.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    /// Flush pending writes.
    pub async fn close(&self) {
        self.store.close().await;
    }

    /// Send a request, optionally authenticated and with a JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, token: &str, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, None, Some(body)).await
    }

    pub async fn post_as(&self, token: &str, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put_as(&self, token: &str, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete_as(&self, token: &str, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Sign in as the seeded administrator.
    pub async fn admin_token(&self) -> String {
        self.sign_in(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD)
            .await
    }

    /// Sign in and return the bearer token.
    pub async fn sign_in(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/signin",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "signin failed: {:?}", response.body);
        token_of(&response)
    }

    /// The outstanding OTP for `email`, read straight from the store.
    #[must_use]
    pub fn pending_otp(&self, email: &str, purpose: OtpPurpose) -> Option<String> {
        self.store.read(|doc| {
            doc.otp_requests
                .iter()
                .find(|request| request.is_for(email, purpose))
                .map(|request| request.otp.clone())
        })
    }

    /// Register a customer through the OTP flow and return their token.
    pub async fn signup_customer(&self, name: &str, email: &str, password: &str) -> String {
        let started = self
            .post(
                "/api/auth/signup/start",
                &serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(started.status, StatusCode::OK, "signup failed: {:?}", started.body);

        let otp = self
            .pending_otp(email, OtpPurpose::Signup)
            .expect("signup OTP was not stored");
        let verified = self
            .post(
                "/api/auth/signup/verify",
                &serde_json::json!({ "email": email, "otp": otp }),
            )
            .await;
        assert_eq!(verified.status, StatusCode::OK, "verify failed: {:?}", verified.body);
        token_of(&verified)
    }
}

/// The `token` field of a session response.
#[must_use]
pub fn token_of(response: &TestResponse) -> String {
    response.body["token"]
        .as_str()
        .expect("response has no token")
        .to_owned()
}

async fn start(dir: &TempDir) -> (Router, Arc<DocumentStore>) {
    let config = StorefrontConfig::local(
        dir.path().join("data.json"),
        dir.path().join("uploads"),
        SecretString::from("integration-test-secret-with-enough-length"),
    );
    let admin = admin_seed(&config.data).expect("Failed to prepare admin account");
    let store = Arc::new(
        DocumentStore::open(StoreOptions::new(&config.data, admin))
            .await
            .expect("Failed to open document store"),
    );
    let state = AppState::new(config, Arc::clone(&store)).expect("Failed to build state");
    (routes::app(state, RateLimits::Disabled), store)
}
