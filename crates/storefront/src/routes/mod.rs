//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /api/health                          - Liveness check
//!
//! # Public catalog (no auth)
//! GET  /api/public/home                     - Slides, featured products, top navigation
//! GET  /api/public/navigation               - Category menus
//! GET  /api/public/shop                     - Filtered product listing
//! GET  /api/public/product/{slug}           - Product by slug or ID
//! GET  /api/public/content/{key}            - Static page
//! GET  /api/public/settings                 - Site settings
//! GET  /api/public/hb-productions           - Editorial posts
//! POST /api/public/newsletter/subscribe     - Newsletter signup
//! GET  /api/public/track-order              - Guest order lookup
//!
//! # Accounts
//! POST /api/auth/signup/start               - Email a signup code
//! POST /api/auth/signup/verify              - Redeem the code, create the account
//! POST /api/auth/signin                     - Password sign-in
//! GET  /api/auth/me                         - Caller's profile (auth)
//! PUT  /api/auth/profile                    - Update profile fields (auth)
//! PUT  /api/auth/password                   - Change password (auth)
//! POST /api/auth/password-reset/start       - Email a reset code
//! POST /api/auth/password-reset/verify      - Redeem the code, set a new password
//! POST /api/auth/address                    - Save an address (auth)
//! PUT  /api/auth/address/{id}               - Edit a saved address (auth)
//! DELETE /api/auth/address/{id}             - Remove a saved address (auth)
//!
//! # Checkout
//! GET  /api/checkout/razorpay-config        - Public payment config
//! GET  /api/checkout/my-orders              - Caller's orders (auth)
//! POST /api/checkout/create-order           - Price a cart into an order (auth)
//! POST /api/checkout/confirm-payment        - Mark an order paid (auth)
//!
//! # Back office (admin)
//! /api/admin/...                            - See [`admin`]
//!
//! # Static
//! GET  /uploads/{file}                      - Uploaded media
//! ```

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod public;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware::from_fn,
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::middleware::{
    RateLimits, api_rate_limiter, auth_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Largest accepted request body. Leaves headroom over the upload cap for
/// base64 overhead.
pub const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

/// Build the full application router.
///
/// Sentry layers are added by the binary so that tests can drive this
/// router without a Sentry client.
pub fn app(state: AppState, rate_limits: RateLimits) -> Router {
    let mut auth = auth::routes();
    let mut api = Router::new()
        .nest("/public", public::routes())
        .nest("/checkout", checkout::routes())
        .nest("/admin", admin::routes());

    if rate_limits == RateLimits::Enabled {
        auth = auth.layer(auth_rate_limiter());
        api = api.layer(api_rate_limiter());
    }

    let uploads = ServeDir::new(state.media().dir());
    let cors = cors_layer(&state.config().frontend_url);

    Router::new()
        .route("/api/health", get(health))
        .nest("/api", api.nest("/auth", auth))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// The `Origin` value a browser sends for pages served from `frontend_url`.
///
/// `None` unless it is an absolute http(s) URL with a host.
fn frontend_origin(frontend_url: &str) -> Option<HeaderValue> {
    let url = url::Url::parse(frontend_url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return None;
    }
    HeaderValue::from_str(&url.origin().ascii_serialization()).ok()
}

/// CORS for the storefront frontend, with credentials.
///
/// An unusable `FRONTEND_URL` disables cross-origin access instead of
/// stopping the server.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = frontend_origin(frontend_url).map_or_else(
        || {
            tracing::warn!(frontend_url, "invalid FRONTEND_URL, CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        },
        AllowOrigin::exact,
    );

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Liveness health check. Does not check dependencies.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Trimmed value of an optional text field, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// All of `values` trimmed, or `None` if any is absent or blank.
pub(crate) fn all_present<const N: usize>(values: [Option<&String>; N]) -> Option<[&str; N]> {
    let mut out = [""; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = non_blank(value)?;
    }
    Some(out)
}
