//! Integration tests for checkout: order creation, payment confirmation,
//! order history and guest tracking.
//!
//! Run with: cargo test -p hembit-integration-tests --test checkout

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use hembit_integration_tests::TestApp;

const EMAIL: &str = "ravi@example.com";
const PASSWORD: &str = "festive-season";

fn cart() -> Value {
    json!({
        "items": [
            { "productId": "prd_indigo_kurta", "quantity": 2, "size": "L" },
            { "productId": "prd_linen_shirt", "quantity": "1" },
            { "productId": "prd_missing", "quantity": 5 }
        ],
        "address": {
            "line1": "4 Mill Road",
            "city": "Pune",
            "state": "Maharashtra",
            "postalCode": "411001",
            "country": "India"
        }
    })
}

async fn place_order(app: &TestApp, token: &str) -> Value {
    let resp = app
        .post_as(token, "/api/checkout/create-order", &cart())
        .await;
    assert_eq!(resp.status, StatusCode::OK, "create-order failed: {:?}", resp.body);
    resp.body["order"].clone()
}

#[tokio::test]
async fn test_razorpay_config_is_public() {
    let app = TestApp::spawn().await;

    let resp = app.get("/api/checkout/razorpay-config").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["configured"], false);
    assert_eq!(resp.body["keyId"], "");
}

#[tokio::test]
async fn test_create_order_prices_cart_against_catalog() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Ravi", EMAIL, PASSWORD).await;

    let order = place_order(&app, &token).await;

    // Unknown products are dropped, quantities parsed leniently
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["size"], "L");
    assert_eq!(items[0]["lineTotal"], 4998.0);
    assert_eq!(items[1]["size"], "M");
    assert_eq!(items[1]["quantity"], 1);

    assert_eq!(order["total"], 6897.0);
    assert_eq!(order["status"], "Pending Confirmation");
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["paymentMethod"], "razorpay");
    assert_eq!(order["customer"]["email"], EMAIL);
    assert_eq!(order["address"]["city"], "Pune");

    let timeline: Vec<&str> = order["timeline"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(timeline, ["Order Created", "Pending Confirmation"]);
}

#[tokio::test]
async fn test_create_order_validation() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Ravi", EMAIL, PASSWORD).await;

    let anonymous = app.post("/api/checkout/create-order", &cart()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let empty = app
        .post_as(&token, "/api/checkout/create-order", &json!({ "items": [] }))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.message(), "Cart items are required");

    let unknown = app
        .post_as(
            &token,
            "/api/checkout/create-order",
            &json!({ "items": [{ "productId": "prd_missing" }] }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.message(), "No valid cart items");

    // Nothing was stored for the rejected carts
    assert!(app.store().read(|doc| doc.orders.is_empty()));
}

#[tokio::test]
async fn test_confirm_payment() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Ravi", EMAIL, PASSWORD).await;
    let order = place_order(&app, &token).await;
    let order_id = order["id"].as_str().unwrap();

    let missing = app
        .post_as(&token, "/api/checkout/confirm-payment", &json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "orderId is required");

    let resp = app
        .post_as(
            &token,
            "/api/checkout/confirm-payment",
            &json!({ "orderId": order_id }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.message(),
        "PAYMENT SUCCESSFUL. Thanks for shopping with HEMBIT."
    );
    assert_eq!(resp.body["order"]["status"], "Confirmed");
    assert_eq!(resp.body["order"]["paymentStatus"], "paid");
    assert!(
        resp.body["order"]["paymentId"]
            .as_str()
            .unwrap()
            .starts_with("pay_")
    );

    let timeline = resp.body["order"]["timeline"].as_array().unwrap();
    let last_two: Vec<&str> = timeline[timeline.len() - 2..]
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(last_two, ["Payment Successful", "Confirmed"]);
}

#[tokio::test]
async fn test_confirm_payment_keeps_supplied_payment_id() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Ravi", EMAIL, PASSWORD).await;
    let order = place_order(&app, &token).await;

    let resp = app
        .post_as(
            &token,
            "/api/checkout/confirm-payment",
            &json!({ "orderId": order["id"], "paymentId": "pay_rzp_123" }),
        )
        .await;
    assert_eq!(resp.body["order"]["paymentId"], "pay_rzp_123");
}

#[tokio::test]
async fn test_cannot_confirm_someone_elses_order() {
    let app = TestApp::spawn().await;
    let owner = app.signup_customer("Ravi", EMAIL, PASSWORD).await;
    let other = app
        .signup_customer("Meera", "meera@example.com", PASSWORD)
        .await;
    let order = place_order(&app, &owner).await;

    let resp = app
        .post_as(
            &other,
            "/api/checkout/confirm-payment",
            &json!({ "orderId": order["id"] }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.message(), "Order not found");
}

#[tokio::test]
async fn test_my_orders_lists_only_own_orders_newest_first() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Ravi", EMAIL, PASSWORD).await;
    let other = app
        .signup_customer("Meera", "meera@example.com", PASSWORD)
        .await;

    let first = place_order(&app, &token).await;
    let second = place_order(&app, &token).await;
    place_order(&app, &other).await;

    let resp = app.get_as(&token, "/api/checkout/my-orders").await;
    assert_eq!(resp.status, StatusCode::OK);
    let orders = resp.body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], second["id"]);
    assert_eq!(orders[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_track_order_by_id_and_email() {
    let app = TestApp::spawn().await;
    let token = app.signup_customer("Ravi", EMAIL, PASSWORD).await;
    let order = place_order(&app, &token).await;
    let order_id = order["id"].as_str().unwrap();

    let resp = app
        .get(&format!(
            "/api/public/track-order?orderId={order_id}&email=RAVI@example.com"
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["order"]["id"], order_id);
    assert_eq!(resp.body["order"]["total"], 6897.0);
    // Tracking exposes no customer or address details
    assert!(resp.body["order"].get("customer").is_none());
    assert!(resp.body["order"].get("address").is_none());

    let wrong_email = app
        .get(&format!(
            "/api/public/track-order?orderId={order_id}&email=someone@example.com"
        ))
        .await;
    assert_eq!(wrong_email.status, StatusCode::NOT_FOUND);
}
