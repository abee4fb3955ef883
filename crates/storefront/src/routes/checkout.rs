//! Checkout route handlers.
//!
//! Carts are priced server-side from the catalog; client prices are never
//! trusted. Payment capture happens in the browser through Razorpay and is
//! reported back via `confirm-payment`.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hembit_core::{OrderId, OrderStatus, PaymentId, PaymentStatus, ProductId};

use crate::config::RazorpayConfig;
use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{
    AccountSummary, Document, Order, OrderCustomer, OrderItem, PostalAddress, TimelineEntry,
    lenient, order::DEFAULT_SIZE,
};
use crate::routes::non_blank;
use crate::state::AppState;

/// Payment method recorded when the client does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "razorpay";

/// Create the checkout routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/razorpay-config", get(razorpay_config))
        .route("/my-orders", get(my_orders))
        .route("/create-order", post(create_order))
        .route("/confirm-payment", post(confirm_payment))
}

/// Public Razorpay settings for the browser checkout widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayPublicConfig {
    pub key_id: String,
    pub configured: bool,
}

impl From<&RazorpayConfig> for RazorpayPublicConfig {
    fn from(config: &RazorpayConfig) -> Self {
        Self {
            key_id: config.key_id.clone().unwrap_or_default(),
            configured: config.is_configured(),
        }
    }
}

/// Razorpay key ID and whether payments are configured.
#[instrument(skip(state))]
pub async fn razorpay_config(State(state): State<AppState>) -> Json<RazorpayPublicConfig> {
    Json(RazorpayPublicConfig::from(&state.config().razorpay))
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// The caller's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Json<OrdersResponse> {
    let mut orders: Vec<Order> = state.store().read(|doc| {
        doc.orders
            .iter()
            .filter(|o| o.user_id == user.id)
            .cloned()
            .collect()
    });
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(OrdersResponse { orders })
}

// =============================================================================
// Orders
// =============================================================================

/// One cart line as sent by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "lenient::optional_u32")]
    pub quantity: Option<u32>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    pub address: Option<PostalAddress>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: Order,
    pub razorpay: RazorpayPublicConfig,
}

/// Price a cart line against the catalog. Unknown products yield `None`.
fn price_line(doc: &Document, line: &CartLine) -> Option<OrderItem> {
    let product = doc.find_product(line.product_id.as_ref()?)?;
    let quantity = line.quantity.unwrap_or(1).max(1);
    let size = non_blank(line.size.as_ref()).unwrap_or(DEFAULT_SIZE);

    Some(OrderItem {
        product_id: product.id.clone(),
        name: product.name.clone(),
        size: size.to_owned(),
        quantity,
        price: product.price,
        image: product.images.first().cloned().unwrap_or_default(),
        line_total: product.price * Decimal::from(quantity),
    })
}

/// Build a pending order for `account` from already-priced items.
fn new_order(
    doc: &Document,
    account: &AccountSummary,
    items: Vec<OrderItem>,
    address: Option<PostalAddress>,
    payment_method: String,
) -> Order {
    let now = Utc::now();
    let (name, email) = doc.find_user(&account.id).map_or_else(
        || (account.name.clone(), account.email.clone()),
        |u| (u.name.clone(), u.email.clone()),
    );
    let total = items.iter().map(|item| item.line_total).sum();

    Order {
        id: OrderId::generate(),
        user_id: account.id.clone(),
        customer: OrderCustomer { name, email },
        items,
        address,
        total,
        payment_method,
        payment_status: PaymentStatus::Pending,
        payment_id: None,
        status: OrderStatus::pending_confirmation(),
        timeline: vec![
            TimelineEntry::new("Order Created", now),
            TimelineEntry::new(OrderStatus::pending_confirmation().as_str(), now),
        ],
        created_at: now,
        updated_at: now,
    }
}

/// Turn the caller's cart into a pending order.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>> {
    if request.items.is_empty() {
        return Err(AppError::bad_request("Cart items are required"));
    }

    let payment_method = non_blank(request.payment_method.as_ref())
        .unwrap_or(DEFAULT_PAYMENT_METHOD)
        .to_owned();

    let order = state.store().try_write(|doc| {
        let items: Vec<OrderItem> = request
            .items
            .iter()
            .filter_map(|line| price_line(doc, line))
            .collect();
        if items.is_empty() {
            return Err(AppError::bad_request("No valid cart items"));
        }

        let order = new_order(doc, &user, items, request.address, payment_method);
        doc.orders.insert(0, order.clone());
        Ok(order)
    })?;

    add_breadcrumb("checkout", "Order created", Some(&[("order_id", order.id.as_str())]));
    tracing::info!(order_id = %order.id, total = %order.total, "order created");

    Ok(Json(CreateOrderResponse {
        order,
        razorpay: RazorpayPublicConfig::from(&state.config().razorpay),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub message: String,
    pub order: Order,
}

/// Mark one of the caller's orders as paid and confirmed.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>> {
    let order_id = non_blank(request.order_id.as_ref())
        .map(OrderId::new)
        .ok_or_else(|| AppError::bad_request("orderId is required"))?;
    let payment_id = non_blank(request.payment_id.as_ref())
        .map_or_else(PaymentId::generate, PaymentId::new);

    let order = state.store().try_write(|doc| {
        let order = doc
            .find_order_mut(&order_id)
            .filter(|o| o.user_id == user.id)
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        let now = Utc::now();
        order.payment_status = PaymentStatus::Paid;
        order.payment_id = Some(payment_id);
        order.timeline.push(TimelineEntry::new("Payment Successful", now));
        order.transition(OrderStatus::confirmed(), now);
        Ok::<_, AppError>(order.clone())
    })?;

    tracing::info!(order_id = %order.id, "payment confirmed");

    Ok(Json(ConfirmPaymentResponse {
        message: "PAYMENT SUCCESSFUL. Thanks for shopping with HEMBIT.".to_string(),
        order,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn catalog() -> Document {
        serde_json::from_value(json!({
            "products": [{
                "id": "prd_kurta",
                "name": "Indigo Kurta",
                "slug": "indigo-kurta",
                "categoryId": "cat_men",
                "seriesId": "ser_festive",
                "price": 2499,
                "images": ["/uploads/kurta.jpg", "/uploads/kurta-2.jpg"]
            }]
        }))
        .unwrap()
    }

    fn line(value: serde_json::Value) -> CartLine {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_price_line_copies_catalog_fields() {
        let doc = catalog();
        let cart_line = line(json!({"productId": "prd_kurta", "quantity": 3, "size": "L"}));
        let item = price_line(&doc, &cart_line).unwrap();

        assert_eq!(item.name, "Indigo Kurta");
        assert_eq!(item.size, "L");
        assert_eq!(item.image, "/uploads/kurta.jpg");
        assert_eq!(item.line_total, Decimal::from(7497));
    }

    #[test]
    fn test_price_line_defaults() {
        let doc = catalog();
        let negative = line(json!({"productId": "prd_kurta", "quantity": -2}));
        let item = price_line(&doc, &negative).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.size, DEFAULT_SIZE);

        let text = line(json!({"productId": "prd_kurta", "quantity": "2"}));
        assert_eq!(price_line(&doc, &text).unwrap().quantity, 2);
    }

    #[test]
    fn test_unknown_product_is_dropped() {
        let doc = catalog();
        assert!(price_line(&doc, &line(json!({"productId": "prd_missing"}))).is_none());
        assert!(price_line(&doc, &line(json!({"quantity": 1}))).is_none());
    }
}
