//! Coupon registration and maintenance over HTTP.

#![allow(clippy::unwrap_used)]

use bazaar_core::Money;
use bazaar_core::coupon::CouponDiscount;
use bazaar_integration_tests::{TestServer, shipping_info};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn coupons(server: &TestServer, token: &str) -> Vec<Value> {
    let resp = server.send(Method::GET, "/coupons", token, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

async fn register(server: &TestServer, token: &str, definition_id: i32) -> i64 {
    let resp = server
        .send(
            Method::POST,
            "/coupons",
            token,
            Some(json!({ "couponDefinitionId": definition_id })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    body["couponId"].as_i64().unwrap()
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_copies_definition() {
    let server = TestServer::start().await;
    let definition = server
        .add_coupon_definition("Welcome", CouponDiscount::Ratio(Decimal::from(10)))
        .await;
    let (_, token) = server.member("alice").await;

    let coupon_id = register(&server, &token, definition.id.as_i32()).await;

    let listed = coupons(&server, &token).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_i64(), Some(coupon_id));
    assert_eq!(listed[0]["name"], "Welcome");
    assert_eq!(listed[0]["used"], false);
    assert_eq!(listed[0]["discount"]["type"], "RATIO");
}

#[tokio::test]
async fn test_register_unknown_definition_is_not_found() {
    let server = TestServer::start().await;
    let (_, token) = server.member("alice").await;

    let resp = server
        .send(
            Method::POST,
            "/coupons",
            &token,
            Some(json!({ "couponDefinitionId": 77 })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Update and delete
// ============================================================================

#[tokio::test]
async fn test_marking_used_hides_coupon() {
    let server = TestServer::start().await;
    let definition = server
        .add_coupon_definition("Flat", CouponDiscount::Fixed(Money::from_units(500)))
        .await;
    let (_, token) = server.member("alice").await;
    let coupon_id = register(&server, &token, definition.id.as_i32()).await;

    let resp = server
        .send(
            Method::PUT,
            "/coupons",
            &token,
            Some(json!({
                "id": coupon_id,
                "name": "Flat",
                "used": true,
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(coupons(&server, &token).await.is_empty());
}

#[tokio::test]
async fn test_spent_coupon_cannot_be_reset_and_reused() {
    let server = TestServer::start().await;
    let product = server.add_product("Kettle", 1000).await;
    let definition = server
        .add_coupon_definition("Flat", CouponDiscount::Fixed(Money::from_units(500)))
        .await;
    let (_, token) = server.member("alice").await;
    let coupon_id = register(&server, &token, definition.id.as_i32()).await;
    let order = json!({
        "orderLines": [{ "productId": product.id, "quantity": 1 }],
        "shippingInfo": shipping_info("1 Market Street"),
        "coupons": [coupon_id],
    });

    let resp = server
        .send(Method::POST, "/orders/place-order", &token, Some(order.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = server
        .send(
            Method::PUT,
            "/coupons",
            &token,
            Some(json!({ "id": coupon_id, "name": "Flat", "used": false })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(coupons(&server, &token).await.is_empty());

    let resp = server
        .send(Method::POST, "/orders/place-order", &token, Some(order))
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_members_cannot_change_the_discount() {
    let server = TestServer::start().await;
    let definition = server
        .add_coupon_definition("Welcome", CouponDiscount::Ratio(Decimal::from(10)))
        .await;
    let (_, token) = server.member("alice").await;
    let coupon_id = register(&server, &token, definition.id.as_i32()).await;

    let resp = server
        .send(
            Method::PUT,
            "/coupons",
            &token,
            Some(json!({
                "id": coupon_id,
                "name": "Free",
                "used": false,
                "discount": { "type": "RATIO", "value": "100" },
            })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("discount"));
    let listed = coupons(&server, &token).await;
    assert_eq!(listed[0]["name"], "Welcome");
    assert_eq!(listed[0]["discount"]["value"], "10");
}

#[tokio::test]
async fn test_delete_only_affects_own_coupons() {
    let server = TestServer::start().await;
    let definition = server
        .add_coupon_definition("Welcome", CouponDiscount::Ratio(Decimal::from(10)))
        .await;
    let (_, alice) = server.member("alice").await;
    let (_, bob) = server.member("bob").await;
    let coupon_id = register(&server, &alice, definition.id.as_i32()).await;

    let resp = server
        .send(
            Method::DELETE,
            &format!("/coupons?couponId={coupon_id}"),
            &bob,
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(coupons(&server, &alice).await.len(), 1);

    let resp = server
        .send(
            Method::DELETE,
            &format!("/coupons?couponId={coupon_id}"),
            &alice,
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(coupons(&server, &alice).await.is_empty());
}
