//! Integration tests for the unauthenticated storefront endpoints.
//!
//! Run with: cargo test -p hembit-integration-tests --test public_catalog

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use hembit_integration_tests::TestApp;

// ============================================================================
// Home & Navigation
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let resp = app.get("/api/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
}

#[tokio::test]
async fn test_home_orders_slides_and_resolves_product_slides() {
    let app = TestApp::spawn().await;

    let resp = app.get("/api/public/home").await;
    assert_eq!(resp.status, StatusCode::OK);

    let slides = resp.body["slides"].as_array().unwrap();
    let titles: Vec<&str> = slides.iter().map(|s| s["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["The Festive Edit", "HB Productions", "Staff Picks"]);

    // Only product slides carry resolved products
    assert!(slides[0].get("products").is_none());
    let picks = slides[2]["products"].as_array().unwrap();
    assert_eq!(picks.len(), 2);
    assert_eq!(picks[0]["slug"], "indigo-block-kurta");

    let featured = resp.body["featuredProducts"].as_array().unwrap();
    assert_eq!(featured.len(), 2);
    assert_eq!(featured[0]["displayPrice"], "₹2,499");
    assert_eq!(featured[0]["categoryName"], "Men");
    assert_eq!(featured[0]["seriesName"], "Festive");

    assert_eq!(resp.body["topNavigation"]["logo"], "HEMBIT");
    assert_eq!(resp.body["topNavigation"]["left"][2], "HB PRODUCTIONS");
}

#[tokio::test]
async fn test_navigation_lists_categories() {
    let app = TestApp::spawn().await;

    let resp = app.get("/api/public/navigation").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["men"].as_array().unwrap().len(), 2);
    assert_eq!(resp.body["highlights"], resp.body["men"]);
    assert_eq!(resp.body["men"][0]["series"][0]["slug"], "festive");
    assert_eq!(resp.body["hbProductionsCount"], 1);
}

// ============================================================================
// Shop & Product
// ============================================================================

#[tokio::test]
async fn test_shop_filters() {
    let app = TestApp::spawn().await;

    let all = app.get("/api/public/shop").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["products"].as_array().unwrap().len(), 3);
    assert_eq!(all.body["categories"].as_array().unwrap().len(), 2);

    let men = app.get("/api/public/shop?category=men").await;
    assert_eq!(men.body["products"].as_array().unwrap().len(), 2);

    let festive = app.get("/api/public/shop?series=festive").await;
    let festive = festive.body["products"].as_array().unwrap().clone();
    assert_eq!(festive.len(), 1);
    assert_eq!(festive[0]["id"], "prd_indigo_kurta");

    let search = app.get("/api/public/shop?search=LINEN").await;
    let search = search.body["products"].as_array().unwrap().clone();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0]["slug"], "ecru-linen-shirt");
}

#[tokio::test]
async fn test_shop_unknown_category_does_not_filter() {
    let app = TestApp::spawn().await;

    let resp = app.get("/api/public/shop?category=nope").await;
    assert_eq!(resp.body["products"].as_array().unwrap().len(), 3);

    let resp = app.get("/api/public/shop?category=&search=").await;
    assert_eq!(resp.body["products"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_product_by_slug_or_id() {
    let app = TestApp::spawn().await;

    let by_slug = app.get("/api/public/product/midnight-bandhgala").await;
    assert_eq!(by_slug.status, StatusCode::OK);
    assert_eq!(by_slug.body["product"]["displayPrice"], "₹12,500");

    let by_id = app.get("/api/public/product/prd_bandhgala").await;
    assert_eq!(by_id.body["product"]["slug"], "midnight-bandhgala");

    let missing = app.get("/api/public/product/does-not-exist").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Product not found");
}

// ============================================================================
// Content, Settings & HB Productions
// ============================================================================

#[tokio::test]
async fn test_content_pages() {
    let app = TestApp::spawn().await;

    let about = app.get("/api/public/content/about").await;
    assert_eq!(about.status, StatusCode::OK);
    assert_eq!(about.body["content"]["title"], "About HEMBIT");

    let missing = app.get("/api/public/content/careers").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Content not found");
}

#[tokio::test]
async fn test_settings_and_posts() {
    let app = TestApp::spawn().await;

    let settings = app.get("/api/public/settings").await;
    assert_eq!(
        settings.body["settings"]["serviceContact"]["supportEmail"],
        "support@hembit.in"
    );

    let posts = app.get("/api/public/hb-productions").await;
    assert_eq!(posts.body["posts"][0]["title"], "Behind the Loom");
}

#[tokio::test]
async fn test_blank_settings_are_filled_on_load() {
    let app = TestApp::with_document(&json!({
        "settings": { "serviceContact": { "supportEmail": "  ", "contactNumber": "" } }
    }))
    .await;

    let resp = app.get("/api/public/settings").await;
    let contact = &resp.body["settings"]["serviceContact"];
    assert_eq!(contact["supportEmail"], "support@hembit.in");
    assert_eq!(contact["contactNumber"], "+91 00000 00000");
    assert_eq!(contact["contactHours"], "Mon-Sat 9AM-7PM IST");

    // Every editable page exists even in an empty document
    let terms = app.get("/api/public/content/terms").await;
    assert_eq!(terms.status, StatusCode::OK);
}

// ============================================================================
// Newsletter
// ============================================================================

#[tokio::test]
async fn test_newsletter_subscribe_is_idempotent() {
    let app = TestApp::spawn().await;

    let first = app
        .post(
            "/api/public/newsletter/subscribe",
            &json!({ "email": "Reader@Example.com " }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.message(), "Subscribed successfully");

    let again = app
        .post(
            "/api/public/newsletter/subscribe",
            &json!({ "email": "reader@example.com" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);

    let subscribers = app.store().read(|doc| doc.newsletter_subscribers.clone());
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email, "reader@example.com");
}

#[tokio::test]
async fn test_newsletter_subscribe_validation() {
    let app = TestApp::spawn().await;

    let missing = app.post("/api/public/newsletter/subscribe", &json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Email is required");

    let invalid = app
        .post(
            "/api/public/newsletter/subscribe",
            &json!({ "email": "not-an-email" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.message(), "Invalid email address");
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let resp = app
        .request(
            axum::http::Method::POST,
            "/api/public/newsletter/subscribe",
            None,
            Some(&json!("just a string")),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_query_is_a_json_bad_request() {
    let app = TestApp::spawn().await;

    for uri in [
        "/api/public/shop?category=men&category=highlights",
        "/api/public/track-order?orderId=ord_1&orderId=ord_2&email=a@b.com",
    ] {
        let resp = app.get(uri).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(resp.body.is_object(), "{uri}: {:?}", resp.body);
        assert!(resp.message().contains("duplicate field"), "{uri}");
    }
}

#[tokio::test]
async fn test_track_order_requires_both_fields() {
    let app = TestApp::spawn().await;

    let resp = app.get("/api/public/track-order?orderId=ord_1").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.message(), "orderId and email are required");

    let resp = app
        .get("/api/public/track-order?orderId=ord_1&email=a@b.com")
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.message(), "Order not found");
}
