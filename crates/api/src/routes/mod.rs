//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Store reachability check
//!
//! # Members
//! POST /members/join           - Register (public)
//! POST /members/sign-in        - Exchange credentials for a token (public)
//! GET  /members/me             - Authenticated member's profile
//!
//! # Catalog (public)
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//! GET  /categories             - Category listing
//!
//! # Cart
//! GET    /carts                - Cart rows
//! POST   /carts                - Add a product
//! PUT    /carts                - Change a row's quantity
//! DELETE /carts?cartId=        - Remove a row
//! DELETE /carts-all            - Empty the cart
//!
//! # Orders
//! GET    /orders/my-order      - Order history
//! POST   /orders/place-order   - Place an order
//! POST   /orders/shipping-info - Change shipping info of a placed order
//! POST   /orders/start-shipping - Ship, with a version check
//! PUT    /orders               - Update shipping info
//! DELETE /orders?orderId=      - Cancel
//!
//! # Coupons
//! GET    /coupons              - Unused coupons
//! POST   /coupons              - Issue from a definition
//! PUT    /coupons              - Rename, or mark used
//! DELETE /coupons?couponId=    - Delete
//! ```

pub mod carts;
pub mod catalog;
pub mod coupons;
pub mod health;
pub mod members;
pub mod orders;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::middleware::{authenticate, request_id_middleware};
use crate::state::AppState;

/// Acknowledgement body for mutations that return nothing else.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub(crate) const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Create the member routes router.
pub fn member_routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route("/join", post(members::join::<D>))
        .route("/sign-in", post(members::sign_in::<D>))
        .route("/me", get(members::me))
}

/// Create the order routes router.
pub fn order_routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route(
            "/",
            axum::routing::put(orders::update::<D>).delete(orders::cancel::<D>),
        )
        .route("/my-order", get(orders::my_orders::<D>))
        .route("/place-order", post(orders::place::<D>))
        .route("/shipping-info", post(orders::change_shipping_info::<D>))
        .route("/start-shipping", post(orders::start_shipping::<D>))
}

/// Create all routes for the API.
pub fn routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<D>))
        .nest("/members", member_routes())
        .route("/products", get(catalog::products::<D>))
        .route("/products/{id}", get(catalog::product::<D>))
        .route("/categories", get(catalog::categories::<D>))
        .route(
            "/carts",
            get(carts::list::<D>)
                .post(carts::add::<D>)
                .put(carts::update::<D>)
                .delete(carts::remove::<D>),
        )
        .route("/carts-all", delete(carts::remove_all::<D>))
        .nest("/orders", order_routes())
        .route(
            "/coupons",
            get(coupons::list::<D>)
                .post(coupons::register::<D>)
                .put(coupons::update::<D>)
                .delete(coupons::remove::<D>),
        )
}

/// Full application router: routes, authentication, request IDs and tracing.
pub fn router<D: Database>(state: AppState<D>) -> Router {
    routes()
        .layer(from_fn_with_state(state.clone(), authenticate::<D>))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                username = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
