//! Back-office route handlers.
//!
//! Every handler takes [`RequireAdmin`], so non-admins get 403 and anonymous
//! callers 401 before any work is done.
//!
//! ```text
//! POST   /media/upload                       - Store a data-URL upload
//! GET    /dashboard                          - Collection counts
//! GET    /users                              - Accounts, newest first
//!
//! GET    /products                           - Products with categories
//! POST   /products                           - Create a product
//! PUT    /products/{id}                      - Update a product
//! DELETE /products/{id}                      - Delete a product
//! GET    /categories                         - Categories
//! POST   /categories                         - Create a category
//! PUT    /categories/{id}                    - Rename a category
//! DELETE /categories/{id}                    - Delete a category and its products
//! POST   /categories/{id}/series             - Add a series
//! DELETE /categories/{id}/series/{seriesId}  - Delete a series and its products
//!
//! GET    /slides                             - Homepage slides
//! POST   /slides                             - Create a slide
//! PUT    /slides/{id}                        - Update a slide
//! DELETE /slides/{id}                        - Delete a slide
//! GET    /content                            - Static pages
//! PUT    /content/{key}                      - Edit a static page
//! GET    /settings                           - Site settings
//! PUT    /settings                           - Edit service contact details
//! GET    /hb-productions                     - Editorial posts
//! POST   /hb-productions                     - Publish a post
//! DELETE /hb-productions/{id}                - Delete a post
//!
//! GET    /orders                             - All orders
//! PUT    /orders/{id}/status                 - Move an order to a new status
//!
//! GET    /mail/recipients                    - Audience lists
//! POST   /mail/send                          - Broadcast to an audience
//! GET    /newsletter                         - Subscribers and mail history
//! POST   /newsletter/send                    - Broadcast to subscribers
//! ```

pub mod catalog;
pub mod content;
pub mod mail;
pub mod media;
pub mod orders;

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tracing::instrument;

use crate::middleware::RequireAdmin;
use crate::models::AdminUserView;
use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/media/upload", post(media::upload))
        .route("/dashboard", get(dashboard))
        .route("/users", get(users))
        // Catalog
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            put(catalog::update_product).delete(catalog::delete_product),
        )
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        .route("/categories/{id}/series", post(catalog::add_series))
        .route(
            "/categories/{id}/series/{series_id}",
            delete(catalog::delete_series),
        )
        // Content
        .route(
            "/slides",
            get(content::list_slides).post(content::create_slide),
        )
        .route(
            "/slides/{id}",
            put(content::update_slide).delete(content::delete_slide),
        )
        .route("/content", get(content::list_content))
        .route("/content/{key}", put(content::update_content))
        .route(
            "/settings",
            get(content::get_settings).put(content::update_settings),
        )
        .route(
            "/hb-productions",
            get(content::list_posts).post(content::create_post),
        )
        .route("/hb-productions/{id}", delete(content::delete_post))
        // Orders
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}/status", put(orders::update_status))
        // Mail
        .route("/mail/recipients", get(mail::recipients))
        .route("/mail/send", post(mail::send))
        .route("/newsletter", get(mail::newsletter))
        .route("/newsletter/send", post(mail::send_newsletter))
}

/// Plain `{message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline counts for the admin dashboard.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub users: usize,
    pub products: usize,
    pub categories: usize,
    pub orders: usize,
    /// Orders not yet delivered.
    pub pending_orders: usize,
    pub subscribers: usize,
    pub hb_productions_posts: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub metrics: DashboardMetrics,
}

#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<DashboardResponse> {
    let metrics = state.store().read(|doc| DashboardMetrics {
        users: doc.users.len(),
        products: doc.products.len(),
        categories: doc.categories.len(),
        orders: doc.orders.len(),
        pending_orders: doc
            .orders
            .iter()
            .filter(|o| !o.status.is_delivered())
            .count(),
        subscribers: doc.newsletter_subscribers.len(),
        hb_productions_posts: doc.hb_productions.len(),
    });
    Json(DashboardResponse { metrics })
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<AdminUserView>,
    pub count: usize,
}

/// Every account without password hashes, newest first. Accounts with no
/// creation time sort last.
#[instrument(skip(state, _admin))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<UsersResponse> {
    let mut users: Vec<AdminUserView> =
        state.store().read(|doc| doc.users.iter().map(|u| u.admin_view()).collect());
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Json(UsersResponse {
        count: users.len(),
        users,
    })
}
