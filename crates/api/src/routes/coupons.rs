//! Coupon route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use bazaar_core::coupon::UserCoupon;
use bazaar_core::{CouponDefinitionId, UserCouponId};

use super::Message;
use crate::db::Database;
use crate::error::Result;
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::CurrentMember;
use crate::services::coupons::{CouponService, CouponUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCouponBody {
    pub coupon_definition_id: CouponDefinitionId,
}

/// Member-editable coupon fields. The discount is fixed once issued.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCouponBody {
    pub id: UserCouponId,
    pub name: String,
    pub used: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponIdQuery {
    pub coupon_id: UserCouponId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRegistered {
    pub coupon_id: UserCouponId,
}

pub async fn list<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
) -> Result<Json<Vec<UserCoupon>>> {
    Ok(Json(
        CouponService::new(state.db()).list_unused(member.id).await?,
    ))
}

pub async fn register<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<RegisterCouponBody>,
) -> Result<(StatusCode, Json<CouponRegistered>)> {
    let coupon_id = CouponService::new(state.db())
        .register(member.id, body.coupon_definition_id)
        .await?;

    Ok((StatusCode::CREATED, Json(CouponRegistered { coupon_id })))
}

pub async fn update<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    JsonBody(body): JsonBody<UpdateCouponBody>,
) -> Result<Json<UserCoupon>> {
    let coupon = CouponService::new(state.db())
        .update(
            member.id,
            CouponUpdate {
                id: body.id,
                name: body.name,
                used: body.used,
            },
        )
        .await?;

    Ok(Json(coupon))
}

pub async fn remove<D: Database>(
    State(state): State<AppState<D>>,
    CurrentMember(member): CurrentMember,
    QueryParams(query): QueryParams<CouponIdQuery>,
) -> Result<(StatusCode, Json<Message>)> {
    CouponService::new(state.db())
        .delete(member.id, query.coupon_id)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(Message::new("Coupon deleted"))))
}
