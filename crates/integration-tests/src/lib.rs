//! End-to-end tests for the Bazaar API.
//!
//! Each test starts the full router (authentication, request IDs, path
//! normalization) on an ephemeral port, backed by a fresh in-process store,
//! and talks to it over real HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! No database or environment variables are needed.

use std::net::SocketAddr;

use axum::ServiceExt;
use axum::extract::Request;
use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use bazaar_api::config::{ApiConfig, JwtConfig, LogFormat};
use bazaar_api::db::{CatalogRepository, CouponRepository, Database, UnitOfWork};
use bazaar_api::db::memory::MemoryDatabase;
use bazaar_api::routes;
use bazaar_api::state::AppState;
use bazaar_core::catalog::Product;
use bazaar_core::coupon::{CouponDefinition, CouponDiscount};
use bazaar_core::{MemberGrade, MemberId, Money, ProductId};

pub const JWT_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";
pub const JWT_ISSUER: &str = "bazaar";
pub const PASSWORD: &str = "correct-horse-battery";

/// A running API server with its own store.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    db: MemoryDatabase,
}

impl TestServer {
    /// Start a server on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let db = MemoryDatabase::new();
        let state = AppState::new(test_config(), db.clone());
        let app = bazaar_api::normalize_paths(routes::router(state));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            db,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Add a product directly to the store.
    ///
    /// # Panics
    ///
    /// Panics if the store rejects the insert.
    pub async fn add_product(&self, title: &str, price: i64) -> Product {
        let mut uow = self.db.begin().await.expect("begin");
        let category = uow.insert_category("General").await.expect("category");
        let product = uow
            .insert_product(
                title,
                Money::from_units(price),
                Some(category.id),
                &[format!("/images/{title}.jpg")],
            )
            .await
            .expect("product");
        uow.commit().await.expect("commit");
        product
    }

    /// Add a coupon definition directly to the store.
    ///
    /// # Panics
    ///
    /// Panics if the store rejects the insert.
    pub async fn add_coupon_definition(
        &self,
        name: &str,
        discount: CouponDiscount,
    ) -> CouponDefinition {
        let mut uow = self.db.begin().await.expect("begin");
        let definition = uow
            .insert_coupon_definition(name, discount)
            .await
            .expect("definition");
        uow.commit().await.expect("commit");
        definition
    }

    /// Change a product's catalog price.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn set_price(&self, product_id: ProductId, price: i64) {
        assert!(
            self.db
                .set_product_price(product_id, Money::from_units(price))
                .await
        );
    }

    pub async fn set_grade(&self, member_id: i64, grade: MemberGrade) {
        let id = MemberId::new(i32::try_from(member_id).expect("member id fits i32"));
        assert!(self.db.set_member_grade(id, grade).await);
    }

    /// Register a member and return the response body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the member is not created.
    pub async fn join(&self, username: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/members/join"))
            .json(&json!({
                "username": username,
                "password": PASSWORD,
                "name": format!("{username} shopper"),
            }))
            .send()
            .await
            .expect("join request");
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.expect("join body")
    }

    /// Sign in and return the access token.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the credentials are rejected.
    pub async fn sign_in(&self, username: &str) -> String {
        let resp = self
            .client
            .post(self.url("/members/sign-in"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("sign-in request");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("sign-in body");
        body["accessToken"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Join and sign in. Returns `(member id, token)`.
    pub async fn member(&self, username: &str) -> (i64, String) {
        let member = self.join(username).await;
        let token = self.sign_in(username).await;
        (member["id"].as_i64().expect("member id"), token)
    }

    /// Send a JSON request with a bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> Response {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await.expect("request")
    }
}

/// Shipping info body used by order tests.
#[must_use]
pub fn shipping_info(address1: &str) -> Value {
    json!({
        "receiver": { "name": "Receiver", "phone": "010-0000-0000" },
        "address": { "zipCode": "04524", "address1": address1, "address2": "" },
    })
}

/// Parse a money field serialized as a decimal string.
///
/// # Panics
///
/// Panics if the value is not a decimal string.
#[must_use]
pub fn money(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("decimal string")
}

fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("memory:"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        jwt: JwtConfig {
            secret: SecretString::from(JWT_SECRET),
            issuer: JWT_ISSUER.to_string(),
            ttl_secs: 3600,
        },
        log_format: LogFormat::Text,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    }
}
