//! Cart route handlers.
//!
//! Every operation acts on the authenticated member's cart.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use bazaar_core::{CartId, ProductId};

use super::Message;
use crate::db::Database;
use crate::error::Result;
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::CurrentMember;
use crate::services::carts::{CartService, CartView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartBody {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartBody {
    pub cart_id: CartId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartIdQuery {
    pub cart_id: CartId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAdded {
    pub cart_id: CartId,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CartUpdated {
    pub cart: CartView,
    pub message: &'static str,
}

pub async fn list<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
) -> Result<Json<Vec<CartView>>> {
    Ok(Json(CartService::new(state.db()).list(member.id).await?))
}

pub async fn add<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<AddCartBody>,
) -> Result<Json<CartAdded>> {
    let cart_id = CartService::new(state.db())
        .save(member.id, body.product_id, body.quantity)
        .await?;

    Ok(Json(CartAdded {
        cart_id,
        message: "Added to cart",
    }))
}

pub async fn update<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<UpdateCartBody>,
) -> Result<Json<CartUpdated>> {
    let cart = CartService::new(state.db())
        .update(member.id, body.cart_id, body.quantity)
        .await?;

    Ok(Json(CartUpdated {
        cart,
        message: "Cart updated",
    }))
}

pub async fn remove<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    QueryParams(query): QueryParams<CartIdQuery>,
) -> Result<(StatusCode, Json<Message>)> {
    CartService::new(state.db())
        .delete(member.id, query.cart_id)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(Message::new("Cart item removed"))))
}

pub async fn remove_all<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
) -> Result<(StatusCode, Json<Message>)> {
    CartService::new(state.db()).delete_all(member.id).await?;

    Ok((StatusCode::ACCEPTED, Json(Message::new("Cart emptied"))))
}
