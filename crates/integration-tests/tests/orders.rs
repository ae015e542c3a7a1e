//! Order placement and lifecycle over HTTP.

#![allow(clippy::unwrap_used)]

use bazaar_core::coupon::CouponDiscount;
use bazaar_core::{MemberGrade, Money};
use bazaar_integration_tests::{TestServer, money, shipping_info};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn place(server: &TestServer, token: &str, body: Value) -> reqwest::Response {
    server
        .send(Method::POST, "/orders/place-order", token, Some(body))
        .await
}

async fn place_one(server: &TestServer, token: &str, product_id: i32, quantity: i64) -> i64 {
    let resp = place(
        server,
        token,
        json!({
            "orderLines": [{ "productId": product_id, "quantity": quantity }],
            "shippingInfo": shipping_info("1 Market Street"),
            "paymentMethod": "CARD",
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    body["orderId"].as_i64().unwrap()
}

async fn my_orders(server: &TestServer, token: &str) -> Vec<Value> {
    let resp = server
        .send(Method::GET, "/orders/my-order", token, None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
async fn test_missing_parts_are_all_reported() {
    let server = TestServer::start().await;
    let (_, token) = server.member("alice").await;

    let resp = place(&server, &token, json!({})).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    let properties: Vec<&str> = body["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["property"].as_str().unwrap())
        .collect();
    assert_eq!(properties, vec!["orderLines", "shippingInfo"]);
}

#[tokio::test]
async fn test_unknown_product_persists_nothing() {
    let server = TestServer::start().await;
    let (_, token) = server.member("alice").await;

    let resp = place(
        &server,
        &token,
        json!({
            "orderLines": [{ "productId": 12345, "quantity": 1 }],
            "shippingInfo": shipping_info("1 Market Street"),
        }),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(my_orders(&server, &token).await.is_empty());
}

#[tokio::test]
async fn test_standard_member_pays_subtotal() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;

    let order_id = place_one(&server, &token, product.id.as_i32(), 2).await;

    let orders = my_orders(&server, &token).await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["orderId"].as_i64(), Some(order_id));
    assert_eq!(order["state"], "PLACED");
    assert_eq!(order["version"], 0);
    assert_eq!(order["orderer"]["name"], "alice shopper");
    assert_eq!(money(&order["paymentInfo"]["subtotal"]), Decimal::from(2000));
    assert_eq!(money(&order["paymentInfo"]["payable"]), Decimal::from(2000));
    assert_eq!(order["orderLines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_grade_and_coupons_reduce_payable() {
    let server = TestServer::start().await;
    let product = server.add_product("Kettle", 10_000).await;
    let (member_id, token) = server.member("alice").await;
    server.set_grade(member_id, MemberGrade::Vip).await;

    let ratio = server
        .add_coupon_definition("Ten percent", CouponDiscount::Ratio(Decimal::from(10)))
        .await;
    let fixed = server
        .add_coupon_definition("100 off", CouponDiscount::Fixed(Money::from_units(100)))
        .await;

    let mut coupon_ids = Vec::new();
    for definition in [&ratio, &fixed] {
        let resp = server
            .send(
                Method::POST,
                "/coupons",
                &token,
                Some(json!({ "couponDefinitionId": definition.id })),
            )
            .await;
        let body: Value = resp.json().await.unwrap();
        coupon_ids.push(body["couponId"].as_i64().unwrap());
    }

    let order = json!({
        "orderLines": [{ "productId": product.id, "quantity": 1 }],
        "shippingInfo": shipping_info("1 Market Street"),
        "coupons": coupon_ids,
    });
    let resp = place(&server, &token, order.clone()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // 10000 - 10% grade = 9000, - 10% coupon = 8100, - 100 = 8000
    let orders = my_orders(&server, &token).await;
    assert_eq!(money(&orders[0]["paymentInfo"]["payable"]), Decimal::from(8000));

    let resp = server.send(Method::GET, "/coupons", &token, None).await;
    let unused: Vec<Value> = resp.json().await.unwrap();
    assert!(unused.is_empty());

    let resp = place(&server, &token, order).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_quantity_too_large_to_store_is_rejected() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;

    let resp = place(
        &server,
        &token,
        json!({
            "orderLines": [{ "productId": product.id, "quantity": 2_147_483_647_i64 }],
            "shippingInfo": shipping_info("1 Market Street"),
        }),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["violations"],
        json!([{ "property": "orderLines[0].quantity", "code": "out_of_range" }])
    );
    assert!(my_orders(&server, &token).await.is_empty());
}

#[tokio::test]
async fn test_line_prices_are_fixed_at_placement() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;
    place_one(&server, &token, product.id.as_i32(), 3).await;

    server.set_price(product.id, 1500).await;

    let orders = my_orders(&server, &token).await;
    let line = &orders[0]["orderLines"][0];
    assert_eq!(money(&line["price"]), Decimal::from(1000));
    assert_eq!(money(&line["amounts"]), Decimal::from(3000));
    assert_eq!(money(&orders[0]["paymentInfo"]["subtotal"]), Decimal::from(3000));
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let server = TestServer::start().await;
    let (_, token) = server.member("alice").await;

    let resp = server
        .client
        .post(server.url("/orders/place-order"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"orderLines\": [")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_bad_query_gets_json_error() {
    let server = TestServer::start().await;
    let (_, token) = server.member("alice").await;

    let resp = server
        .send(Method::DELETE, "/orders?orderId=first", &token, None)
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_start_shipping_checks_version() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;
    let order_id = place_one(&server, &token, product.id.as_i32(), 1).await;

    let resp = server
        .send(
            Method::POST,
            "/orders/start-shipping",
            &token,
            Some(json!({ "orderId": order_id, "version": 5 })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = server
        .send(
            Method::POST,
            "/orders/start-shipping",
            &token,
            Some(json!({ "orderId": order_id, "version": 0 })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["version"], 1);

    let orders = my_orders(&server, &token).await;
    assert_eq!(orders[0]["state"], "SHIPPED");

    let resp = server
        .send(
            Method::DELETE,
            &format!("/orders?orderId={order_id}"),
            &token,
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;
    let order_id = place_one(&server, &token, product.id.as_i32(), 1).await;

    for _ in 0..2 {
        let resp = server
            .send(
                Method::DELETE,
                &format!("/orders?orderId={order_id}"),
                &token,
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let orders = my_orders(&server, &token).await;
    assert_eq!(orders[0]["state"], "CANCEL");
    assert_eq!(orders[0]["version"], 1);
}

#[tokio::test]
async fn test_change_shipping_info_and_member_address() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;
    let order_id = place_one(&server, &token, product.id.as_i32(), 1).await;

    let resp = server
        .send(
            Method::POST,
            "/orders/shipping-info",
            &token,
            Some(json!({
                "orderId": order_id,
                "shippingInfo": shipping_info("2 Harbor Road"),
                "applyToMemberAddress": true,
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let orders = my_orders(&server, &token).await;
    assert_eq!(orders[0]["shippingInfo"]["address"]["address1"], "2 Harbor Road");

    let resp = server.send(Method::GET, "/members/me", &token, None).await;
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["address"]["address1"], "2 Harbor Road");
}

#[tokio::test]
async fn test_other_members_orders_are_not_found() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, alice) = server.member("alice").await;
    let (_, bob) = server.member("bob").await;
    let order_id = place_one(&server, &alice, product.id.as_i32(), 1).await;

    let resp = server
        .send(
            Method::DELETE,
            &format!("/orders?orderId={order_id}"),
            &bob,
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert!(my_orders(&server, &bob).await.is_empty());
    assert_eq!(my_orders(&server, &alice).await[0]["state"], "PLACED");
}

#[tokio::test]
async fn test_update_order_replaces_shipping_info() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;
    let (_, token) = server.member("alice").await;
    let order_id = place_one(&server, &token, product.id.as_i32(), 1).await;

    let resp = server
        .send(
            Method::PUT,
            "/orders",
            &token,
            Some(json!({
                "orderId": order_id,
                "shippingInfo": shipping_info("3 Garden Lane"),
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["orderId"].as_i64(), Some(order_id));

    let orders = my_orders(&server, &token).await;
    assert_eq!(orders[0]["shippingInfo"]["address"]["address1"], "3 Garden Lane");
}
