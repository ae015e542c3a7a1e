//! Cart flows over HTTP.

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{TestServer, money};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn cart(server: &TestServer, token: &str) -> Vec<Value> {
    let resp = server.send(Method::GET, "/carts", token, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

// ============================================================================
// Adding
// ============================================================================

#[tokio::test]
async fn test_adding_same_product_twice_merges_rows() {
    let server = TestServer::start().await;
    let product = server.add_product("Mug", 4500).await;
    let (_, token) = server.member("alice").await;

    for quantity in [2, 3] {
        let resp = server
            .send(
                Method::POST,
                "/carts",
                &token,
                Some(json!({ "productId": product.id, "quantity": quantity })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let rows = cart(&server, &token).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["quantity"], 5);
    assert_eq!(rows[0]["productName"], "Mug");
    assert_eq!(money(&rows[0]["price"]), Decimal::from(4500));
    assert_eq!(rows[0]["image"], "/images/Mug.jpg");
}

#[tokio::test]
async fn test_adding_unknown_product_is_not_found() {
    let server = TestServer::start().await;
    let (_, token) = server.member("alice").await;

    let resp = server
        .send(
            Method::POST,
            "/carts",
            &token,
            Some(json!({ "productId": 404, "quantity": 1 })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(cart(&server, &token).await.is_empty());
}

#[tokio::test]
async fn test_non_positive_quantity_is_rejected() {
    let server = TestServer::start().await;
    let product = server.add_product("Mug", 4500).await;
    let (_, token) = server.member("alice").await;

    let resp = server
        .send(
            Method::POST,
            "/carts",
            &token,
            Some(json!({ "productId": product.id, "quantity": 0 })),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["violations"][0]["property"], "quantity");
}

// ============================================================================
// Updating and removing
// ============================================================================

#[tokio::test]
async fn test_update_then_remove_row() {
    let server = TestServer::start().await;
    let product = server.add_product("Mug", 4500).await;
    let (_, token) = server.member("alice").await;

    let resp = server
        .send(
            Method::POST,
            "/carts",
            &token,
            Some(json!({ "productId": product.id, "quantity": 1 })),
        )
        .await;
    let added: Value = resp.json().await.unwrap();
    let cart_id = added["cartId"].as_i64().unwrap();

    let resp = server
        .send(
            Method::PUT,
            "/carts",
            &token,
            Some(json!({ "cartId": cart_id, "quantity": 7 })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["cart"]["quantity"], 7);

    let resp = server
        .send(Method::DELETE, &format!("/carts?cartId={cart_id}"), &token, None)
        .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(cart(&server, &token).await.is_empty());
}

#[tokio::test]
async fn test_other_members_rows_are_untouchable() {
    let server = TestServer::start().await;
    let product = server.add_product("Mug", 4500).await;
    let (_, alice) = server.member("alice").await;
    let (_, bob) = server.member("bob").await;

    let resp = server
        .send(
            Method::POST,
            "/carts",
            &alice,
            Some(json!({ "productId": product.id, "quantity": 1 })),
        )
        .await;
    let added: Value = resp.json().await.unwrap();
    let cart_id = added["cartId"].as_i64().unwrap();

    let resp = server
        .send(
            Method::PUT,
            "/carts",
            &bob,
            Some(json!({ "cartId": cart_id, "quantity": 9 })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    server
        .send(Method::DELETE, &format!("/carts?cartId={cart_id}"), &bob, None)
        .await;
    server.send(Method::DELETE, "/carts-all", &bob, None).await;

    let rows = cart(&server, &alice).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["quantity"], 1);
}

#[tokio::test]
async fn test_remove_all_empties_cart() {
    let server = TestServer::start().await;
    let mug = server.add_product("Mug", 4500).await;
    let pen = server.add_product("Pen", 300).await;
    let (_, token) = server.member("alice").await;

    for product in [&mug, &pen] {
        server
            .send(
                Method::POST,
                "/carts",
                &token,
                Some(json!({ "productId": product.id, "quantity": 1 })),
            )
            .await;
    }
    assert_eq!(cart(&server, &token).await.len(), 2);

    let resp = server.send(Method::DELETE, "/carts-all", &token, None).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(cart(&server, &token).await.is_empty());
}
