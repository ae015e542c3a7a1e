//! Order route handlers.
//!
//! The orderer is always the authenticated member; orders belonging to
//! anyone else are reported as not found.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, ProductId, ShippingInfo, UserCouponId};

use super::Message;
use crate::db::Database;
use crate::error::Result;
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::CurrentMember;
use crate::services::orders::{OrderLineRequest, OrderService, OrderView, PlaceOrder};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineBody {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    #[serde(default)]
    pub order_lines: Option<Vec<OrderLineBody>>,
    #[serde(default)]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub coupons: Vec<UserCouponId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeShippingInfoBody {
    pub order_id: OrderId,
    pub shipping_info: ShippingInfo,
    #[serde(default)]
    pub apply_to_member_address: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShippingBody {
    pub order_id: OrderId,
    pub version: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderBody {
    pub order_id: OrderId,
    pub shipping_info: ShippingInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdQuery {
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: OrderId,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingStarted {
    pub order_id: OrderId,
    pub version: i64,
}

pub async fn my_orders<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderService::new(state.db(), state.events())
        .find_orders_for_member(member.id)
        .await?;
    Ok(Json(orders))
}

pub async fn place<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<PlaceOrderBody>,
) -> Result<(StatusCode, Json<OrderAck>)> {
    let request = PlaceOrder {
        orderer: Some(member.id),
        order_lines: body.order_lines.map(|lines| {
            lines
                .into_iter()
                .map(|line| OrderLineRequest {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect()
        }),
        shipping_info: body.shipping_info,
        message: body.message,
        payment_method: body.payment_method,
        coupons: body.coupons,
    };

    let order_id = OrderService::new(state.db(), state.events())
        .place_order(request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderAck {
            order_id,
            message: "Order placed",
        }),
    ))
}

pub async fn change_shipping_info<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<ChangeShippingInfoBody>,
) -> Result<Json<Message>> {
    OrderService::new(state.db(), state.events())
        .change_shipping_info(
            member.id,
            body.order_id,
            body.shipping_info,
            body.apply_to_member_address,
        )
        .await?;

    Ok(Json(Message::new("Shipping info changed")))
}

pub async fn start_shipping<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<StartShippingBody>,
) -> Result<Json<ShippingStarted>> {
    let version = OrderService::new(state.db(), state.events())
        .start_shipping(member.id, body.order_id, body.version)
        .await?;

    Ok(Json(ShippingStarted {
        order_id: body.order_id,
        version,
    }))
}

pub async fn update<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<UpdateOrderBody>,
) -> Result<Json<OrderAck>> {
    let order_id = OrderService::new(state.db(), state.events())
        .update_order(member.id, body.order_id, body.shipping_info)
        .await?;

    Ok(Json(OrderAck {
        order_id,
        message: "Order updated",
    }))
}

pub async fn cancel<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    QueryParams(query): QueryParams<OrderIdQuery>,
) -> Result<Json<Message>> {
    OrderService::new(state.db(), state.events())
        .cancel_order(member.id, query.order_id)
        .await?;

    Ok(Json(Message::new("Order canceled")))
}
