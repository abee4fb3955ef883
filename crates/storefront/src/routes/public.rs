//! Public catalog route handlers.
//!
//! Everything here is readable without an account. Products are always
//! returned as [`ProductView`]s with display fields resolved.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hembit_core::{
    CategoryId, ContentKey, Email, OrderId, OrderStatus, SeriesId, SlideKind, SubscriberId,
};

use crate::error::{ApiJson, ApiQuery, AppError, Result};
use crate::models::{
    Category, ContentPage, Document, OrderItem, Post, ProductView, Series, Settings, Slide,
    Subscriber, TimelineEntry,
};
use crate::routes::non_blank;
use crate::state::AppState;

/// Most featured products shown on the homepage.
pub const FEATURED_LIMIT: usize = 8;

/// Create the public routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/navigation", get(navigation))
        .route("/shop", get(shop))
        .route("/product/{slug}", get(product))
        .route("/content/{key}", get(content))
        .route("/settings", get(settings))
        .route("/hb-productions", get(hb_productions))
        .route("/newsletter/subscribe", post(subscribe))
        .route("/track-order", get(track_order))
}

// =============================================================================
// Home & Navigation
// =============================================================================

/// Homepage payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub slides: Vec<HomeSlide>,
    pub featured_products: Vec<ProductView>,
    pub top_navigation: TopNavigation,
}

/// A slide, with its products resolved when it is a product carousel.
#[derive(Debug, Serialize)]
pub struct HomeSlide {
    #[serde(flatten)]
    pub slide: Slide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductView>>,
}

/// Fixed header layout.
#[derive(Debug, Serialize)]
pub struct TopNavigation {
    pub left: [&'static str; 3],
    pub right: [&'static str; 4],
    pub logo: &'static str,
}

impl Default for TopNavigation {
    fn default() -> Self {
        Self {
            left: ["HIGHLIGHTS", "MEN", "HB PRODUCTIONS"],
            right: ["CART", "SERVICES", "LOGIN", "SEARCH"],
            logo: "HEMBIT",
        }
    }
}

/// Homepage: ordered slides, featured products and the header layout.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    let response = state.store().read(|doc| HomeResponse {
        slides: doc
            .sorted_slides()
            .into_iter()
            .map(|slide| home_slide(doc, slide))
            .collect(),
        featured_products: doc.product_views(
            doc.products
                .iter()
                .filter(|p| p.featured)
                .take(FEATURED_LIMIT),
        ),
        top_navigation: TopNavigation::default(),
    });
    Json(response)
}

fn home_slide(doc: &Document, slide: Slide) -> HomeSlide {
    let products = (slide.kind == SlideKind::Products).then(|| {
        doc.product_views(slide.product_ids.iter().filter_map(|id| doc.find_product(id)))
    });
    HomeSlide { slide, products }
}

/// One category in a navigation menu.
#[derive(Debug, Clone, Serialize)]
pub struct MenuEntry {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub series: Vec<Series>,
}

impl From<&Category> for MenuEntry {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            series: category.series.clone(),
        }
    }
}

/// Header menus.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub highlights: Vec<MenuEntry>,
    pub men: Vec<MenuEntry>,
    pub hb_productions_count: usize,
}

/// Category menus. Both dropdowns currently list every category.
#[instrument(skip(state))]
pub async fn navigation(State(state): State<AppState>) -> Json<NavigationResponse> {
    let response = state.store().read(|doc| {
        let menu: Vec<MenuEntry> = doc.categories.iter().map(MenuEntry::from).collect();
        NavigationResponse {
            highlights: menu.clone(),
            men: menu,
            hb_productions_count: doc.hb_productions.len(),
        }
    });
    Json(response)
}

// =============================================================================
// Shop
// =============================================================================

/// Shop filters. Blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub category: Option<String>,
    pub series: Option<String>,
    pub search: Option<String>,
}

/// Filtered products with the full category tree for the sidebar.
#[derive(Debug, Serialize)]
pub struct ShopResponse {
    pub products: Vec<ProductView>,
    pub categories: Vec<Category>,
}

/// Product listing filtered by category, series and search term.
///
/// An unknown category does not filter. A series slug is resolved to its ID;
/// anything else is compared against series IDs directly.
#[instrument(skip(state))]
pub async fn shop(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShopQuery>,
) -> Result<Json<ShopResponse>> {
    let response = state.store().read(|doc| {
        let category = non_blank(query.category.as_ref())
            .and_then(|key| doc.find_category_by_slug_or_id(key))
            .map(|c| c.id.clone());
        let series = non_blank(query.series.as_ref())
            .map(|key| doc.series_id_for_slug(key).unwrap_or_else(|| SeriesId::new(key)));
        let term = non_blank(query.search.as_ref()).map(str::to_lowercase);

        let products = doc.products.iter().filter(|p| {
            category.as_ref().is_none_or(|id| &p.category_id == id)
                && series.as_ref().is_none_or(|id| &p.series_id == id)
                && term.as_deref().is_none_or(|t| p.matches_search(t))
        });

        ShopResponse {
            products: doc.product_views(products),
            categories: doc.categories.clone(),
        }
    });
    Ok(Json(response))
}

/// A single product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: ProductView,
}

/// Product detail, looked up by slug or ID.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>> {
    state
        .store()
        .read(|doc| {
            doc.find_product_by_slug_or_id(&slug)
                .map(|p| ProductView::derive(doc, p))
        })
        .map(|product| Json(ProductResponse { product }))
        .ok_or_else(|| AppError::not_found("Product not found"))
}

// =============================================================================
// Content
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: ContentPage,
}

/// A static page by key.
#[instrument(skip(state))]
pub async fn content(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ContentResponse>> {
    let key: ContentKey = key
        .parse()
        .map_err(|_| AppError::not_found("Content not found"))?;

    let content = state
        .store()
        .read(|doc| doc.content.get(key.as_str()).cloned())
        .unwrap_or_default();
    Ok(Json(ContentResponse { content }))
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
}

/// Site settings (service contact details).
#[instrument(skip(state))]
pub async fn settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let settings = state.store().read(|doc| doc.settings.clone());
    Json(SettingsResponse { settings })
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

/// HB Productions posts, newest first.
#[instrument(skip(state))]
pub async fn hb_productions(State(state): State<AppState>) -> Json<PostsResponse> {
    let posts = state.store().read(|doc| doc.hb_productions.clone());
    Json(PostsResponse { posts })
}

// =============================================================================
// Newsletter
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Subscribe an address to the newsletter.
///
/// Subscribing an address that is already on the list succeeds without
/// adding a duplicate.
#[instrument(skip(state, request))]
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubscribeRequest>,
) -> Result<Json<MessageResponse>> {
    let email = non_blank(request.email.as_ref())
        .ok_or_else(|| AppError::bad_request("Email is required"))?;
    let email = Email::parse(email).map_err(|_| AppError::bad_request("Invalid email address"))?;

    let added = state.store().write(|doc| {
        if doc.is_subscribed(email.as_str()) {
            return false;
        }
        doc.newsletter_subscribers.push(Subscriber {
            id: SubscriberId::generate(),
            email: email.normalized(),
            subscribed_at: Utc::now(),
        });
        true
    })?;

    if added {
        tracing::info!(email = %email, "newsletter subscription added");
    }

    Ok(Json(MessageResponse {
        message: "Subscribed successfully".to_string(),
    }))
}

// =============================================================================
// Order Tracking
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackOrderQuery {
    pub order_id: Option<String>,
    pub email: Option<String>,
}

/// The subset of an order shown to anyone holding its ID and email.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    pub id: OrderId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TrackOrderResponse {
    pub order: TrackedOrder,
}

/// Guest order lookup by order ID and the email it was placed with.
#[instrument(skip(state, query))]
pub async fn track_order(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrackOrderQuery>,
) -> Result<Json<TrackOrderResponse>> {
    let (Some(order_id), Some(email)) = (
        non_blank(query.order_id.as_ref()),
        non_blank(query.email.as_ref()),
    ) else {
        return Err(AppError::bad_request("orderId and email are required"));
    };

    let order = state
        .store()
        .read(|doc| {
            doc.orders
                .iter()
                .find(|o| o.id == *order_id && o.placed_by_email(email))
                .map(|o| TrackedOrder {
                    id: o.id.clone(),
                    status: o.status.clone(),
                    items: o.items.clone(),
                    total: o.total,
                    timeline: o.timeline.clone(),
                    created_at: o.created_at,
                })
        })
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    Ok(Json(TrackOrderResponse { order }))
}
