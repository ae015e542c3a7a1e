//! Order workflow.
//!
//! Placement validates the whole request up front, snapshots catalog prices
//! into order lines, prices the order and spends coupons in one unit of work.
//! Later transitions load the order, apply the aggregate method and write it
//! back conditionally on the loaded version. Events returned by the aggregate
//! are published only after the commit succeeds.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use bazaar_core::cart::checked_quantity;
use bazaar_core::coupon::UserCoupon;
use bazaar_core::discount;
use bazaar_core::order::{
    MAX_AMOUNT, NewOrder, NewOrderLine, Order, OrderEvent, OrderLine, OrderState, PaymentInfo,
};
use bazaar_core::{MemberId, Money, OrderId, Orderer, ProductId, ShippingInfo, UserCouponId};

use super::{ServiceError, ValidationError, order_write_error};
use crate::db::{CouponRepository, Database, MemberRepository, OrderRepository, UnitOfWork};
use crate::events::EventPublisher;

/// One requested line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Order placement input. Required parts are optional here so that every
/// missing one can be reported together.
#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    pub orderer: Option<MemberId>,
    pub order_lines: Option<Vec<OrderLineRequest>>,
    pub shipping_info: Option<ShippingInfo>,
    pub message: Option<String>,
    pub payment_method: Option<String>,
    pub coupons: Vec<UserCouponId>,
}

/// Order with its lines, as returned to the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: OrderId,
    pub version: i64,
    pub state: OrderState,
    pub orderer: Orderer,
    pub shipping_info: ShippingInfo,
    pub message: Option<String>,
    pub payment_info: PaymentInfo,
    pub created_at: DateTime<Utc>,
    pub order_lines: Vec<OrderLine>,
}

impl OrderView {
    fn new(order: Order, order_lines: Vec<OrderLine>) -> Self {
        Self {
            order_id: order.id,
            version: order.version,
            state: order.state,
            orderer: order.orderer,
            shipping_info: order.shipping_info,
            message: order.message,
            payment_info: order.payment_info,
            created_at: order.created_at,
            order_lines,
        }
    }
}

pub struct OrderService<'a, D: Database> {
    db: &'a D,
    events: &'a dyn EventPublisher,
}

impl<'a, D: Database> OrderService<'a, D> {
    #[must_use]
    pub fn new(db: &'a D, events: &'a dyn EventPublisher) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Place an order and return its id.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` listing every missing or invalid part
    /// - `ServiceError::NotFound` for an unknown member, product or coupon
    /// - `ServiceError::CouponAlreadyUsed` / `ServiceError::DuplicateCoupon`
    #[instrument(skip(self, request), fields(orderer = ?request.orderer))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<OrderId, ServiceError> {
        let (member_id, requested_lines, shipping_info) = validate_placement(&request)?;

        let mut uow = self.db.begin().await?;
        let member = uow
            .find_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("member", member_id))?;

        let lines = snapshot_lines(&mut uow, &requested_lines).await?;
        check_amounts(&lines)?;
        let mut coupons = load_coupons(&mut uow, member_id, &request.coupons).await?;

        let payment_info =
            discount::calculate(&lines, member.grade, &coupons, request.payment_method)?;

        let order = uow
            .insert_order(NewOrder {
                orderer: member.as_orderer(),
                shipping_info,
                message: request.message,
                payment_info,
            })
            .await?;
        uow.insert_order_lines(order.id, &lines).await?;

        for coupon in &mut coupons {
            coupon.mark_used()?;
            uow.update_user_coupon(coupon).await?;
        }
        uow.commit().await?;

        tracing::info!(order_id = %order.id, payable = %order.payment_info.payable, "Order placed");
        self.events.publish(vec![OrderEvent::OrderPlaced {
            order_id: order.id,
            payable: order.payment_info.payable,
        }]);
        Ok(order.id)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Replace the shipping info of a placed order, optionally copying the new
    /// address onto the member.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown or foreign order,
    /// `ServiceError::IllegalState` unless the order is `PLACED`.
    #[instrument(skip(self, shipping_info))]
    pub async fn change_shipping_info(
        &self,
        member_id: MemberId,
        order_id: OrderId,
        shipping_info: ShippingInfo,
        apply_to_member_address: bool,
    ) -> Result<(), ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut order = load_owned_order(&mut uow, member_id, order_id).await?;

        let events = order.change_shipping_info(shipping_info)?;
        uow.update_order(&order).await.map_err(order_write_error)?;

        if apply_to_member_address {
            uow.update_member_address(order.orderer.member_id, &order.shipping_info.address)
                .await?;
        }
        uow.commit().await?;

        self.events.publish(events);
        Ok(())
    }

    /// Ship a placed order, provided the caller saw its current version.
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::VersionConflict` on a stale version and
    /// `ServiceError::IllegalState` unless the order is `PLACED`.
    #[instrument(skip(self))]
    pub async fn start_shipping(
        &self,
        member_id: MemberId,
        order_id: OrderId,
        expected_version: i64,
    ) -> Result<i64, ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut order = load_owned_order(&mut uow, member_id, order_id).await?;

        let events = order.start_shipping(expected_version)?;
        let version = uow.update_order(&order).await.map_err(order_write_error)?;
        uow.commit().await?;

        self.events.publish(events);
        Ok(version)
    }

    /// Cancel an order. Cancelling twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::IllegalState` if the order has shipped.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        member_id: MemberId,
        order_id: OrderId,
    ) -> Result<(), ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut order = load_owned_order(&mut uow, member_id, order_id).await?;

        let events = order.cancel()?;
        if events.is_empty() {
            return Ok(());
        }
        uow.update_order(&order).await.map_err(order_write_error)?;
        uow.commit().await?;

        self.events.publish(events);
        Ok(())
    }

    /// Replace the shipping info of any order that is not cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::IllegalState` if the order is cancelled.
    #[instrument(skip(self, shipping_info))]
    pub async fn update_order(
        &self,
        member_id: MemberId,
        order_id: OrderId,
        shipping_info: ShippingInfo,
    ) -> Result<OrderId, ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut order = load_owned_order(&mut uow, member_id, order_id).await?;

        order.update_shipping_info(shipping_info)?;
        uow.update_order(&order).await.map_err(order_write_error)?;
        uow.commit().await?;

        Ok(order.id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every order of the member, newest first, with its lines.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    pub async fn find_orders_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<OrderView>, ServiceError> {
        let mut uow = self.db.begin().await?;
        let orders = uow.list_orders_for_member(member_id).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();
        let mut lines_by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for line in uow.list_order_lines(&order_ids).await? {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                OrderView::new(order, lines)
            })
            .collect())
    }
}

// =============================================================================
// Helpers
// =============================================================================

type ValidPlacement = (MemberId, Vec<(ProductId, u32)>, ShippingInfo);

/// Check every required part and collect all violations.
fn validate_placement(request: &PlaceOrder) -> Result<ValidPlacement, ServiceError> {
    let mut violations = Vec::new();

    if request.orderer.is_none() {
        violations.push(ValidationError::of("orderer", "empty"));
    }

    let mut lines = Vec::new();
    match request.order_lines.as_deref() {
        None | Some([]) => violations.push(ValidationError::of("orderLines", "empty")),
        Some(requested) => {
            for (index, line) in requested.iter().enumerate() {
                match checked_quantity(line.quantity) {
                    Ok(quantity) => lines.push((line.product_id, quantity)),
                    Err(_) => violations.push(ValidationError::of(
                        format!("orderLines[{index}].quantity"),
                        if line.quantity <= 0 { "positive" } else { "out_of_range" },
                    )),
                }
            }
        }
    }

    if request.shipping_info.is_none() {
        violations.push(ValidationError::of("shippingInfo", "empty"));
    }

    match (request.orderer, request.shipping_info.clone()) {
        (Some(orderer), Some(shipping_info)) if violations.is_empty() => {
            Ok((orderer, lines, shipping_info))
        }
        _ => Err(ServiceError::Validation(violations)),
    }
}

/// Resolve every product in one lookup and capture current prices.
async fn snapshot_lines<U: UnitOfWork>(
    uow: &mut U,
    requested: &[(ProductId, u32)],
) -> Result<Vec<NewOrderLine>, ServiceError> {
    let mut ids: Vec<ProductId> = requested.iter().map(|(id, _)| *id).collect();
    ids.sort_unstable();
    ids.dedup();

    let prices: HashMap<ProductId, _> = uow
        .find_products(&ids)
        .await?
        .into_iter()
        .map(|product| (product.id, product.price))
        .collect();

    requested
        .iter()
        .map(|&(product_id, quantity)| {
            prices
                .get(&product_id)
                .map(|&price| NewOrderLine::new(product_id, price, quantity))
                .ok_or_else(|| ServiceError::not_found("product", product_id))
        })
        .collect()
}

/// Reject lines and subtotals too large to store.
fn check_amounts(lines: &[NewOrderLine]) -> Result<(), ServiceError> {
    let mut violations: Vec<ValidationError> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.amount() > MAX_AMOUNT)
        .map(|(index, _)| {
            ValidationError::of(format!("orderLines[{index}].quantity"), "out_of_range")
        })
        .collect();

    let subtotal: Money = lines.iter().map(NewOrderLine::amount).sum();
    if violations.is_empty() && subtotal > MAX_AMOUNT {
        violations.push(ValidationError::of("orderLines", "out_of_range"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(violations))
    }
}

/// Load the supplied coupons in the order given. Duplicates are kept so the
/// discount calculation can reject them.
async fn load_coupons<U: UnitOfWork>(
    uow: &mut U,
    member_id: MemberId,
    ids: &[UserCouponId],
) -> Result<Vec<UserCoupon>, ServiceError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let unique: Vec<UserCouponId> = ids
        .iter()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let found: HashMap<UserCouponId, UserCoupon> = uow
        .find_user_coupons(&unique)
        .await?
        .into_iter()
        .filter(|coupon| coupon.member_id == member_id)
        .map(|coupon| (coupon.id, coupon))
        .collect();

    ids.iter()
        .map(|id| {
            found
                .get(id)
                .cloned()
                .ok_or_else(|| ServiceError::not_found("coupon", id))
        })
        .collect()
}

async fn load_owned_order<U: UnitOfWork>(
    uow: &mut U,
    member_id: MemberId,
    order_id: OrderId,
) -> Result<Order, ServiceError> {
    uow.find_order(order_id)
        .await?
        .filter(|order| order.orderer.member_id == member_id)
        .ok_or_else(|| ServiceError::not_found("order", order_id))
}
