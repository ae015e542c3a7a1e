//! Which paths need a bearer token.

#![allow(clippy::unwrap_used)]

use bazaar_api::config::JwtConfig;
use bazaar_api::services::auth::TokenService;
use bazaar_core::Username;
use bazaar_integration_tests::{JWT_ISSUER, TestServer};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;

// ============================================================================
// Public paths
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let server = TestServer::start().await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = server
        .client
        .get(server.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_is_public_with_or_without_trailing_slash() {
    let server = TestServer::start().await;
    let product = server.add_product("Notebook", 1000).await;

    for path in ["/products", "/products/", "/categories"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }

    let resp = server
        .client
        .get(server.url(&format!("/products/{}", product.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["title"], "Notebook");
    assert_eq!(body["category"]["name"], "General");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/products/999"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Protected paths
// ============================================================================

#[tokio::test]
async fn test_protected_paths_require_a_token() {
    let server = TestServer::start().await;

    for path in ["/members/me", "/carts", "/coupons", "/orders/my-order"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Authentication required");
    }
}

#[tokio::test]
async fn test_unlisted_path_defaults_to_authenticated() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/not-a-route"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_another_server_is_rejected() {
    let first = TestServer::start().await;
    let second = TestServer::start().await;
    let (_, token) = first.member("alice").await;

    // Same key and issuer, but the member only exists on the first server.
    let resp = second.send(Method::GET, "/members/me", &token, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = first.send(Method::GET, "/members/me", &token, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let server = TestServer::start().await;

    let resp = server
        .send(Method::GET, "/members/me", "not.a.jwt", None)
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn test_token_signed_with_another_key_is_rejected() {
    let server = TestServer::start().await;
    server.join("alice").await;

    let forger = TokenService::new(&JwtConfig {
        secret: SecretString::from("Zq8#Lm2!Vx5@Rt9$Kp3&Hw7*Nc1^Bd4%"),
        issuer: JWT_ISSUER.to_string(),
        ttl_secs: 3600,
    });
    let token = forger.issue(&Username::parse("alice").unwrap()).unwrap();

    let resp = server
        .send(Method::GET, "/members/me", token.as_str(), None)
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
