//! Order aggregate.
//!
//! State machine:
//!
//! ```text
//! PLACED ──start_shipping(version)──▶ SHIPPED
//!   │
//!   └──────────cancel──────────────▶ CANCEL (terminal)
//! ```
//!
//! Mutating methods return the events the transition produced instead of
//! publishing them. Callers forward the list once the change is persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, OrderId, OrderLineId, Orderer, ProductId, ShippingInfo};

/// Errors raised by order state transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Caller's version does not match the stored one.
    #[error("order {order_id} is at version {actual}, caller expected {expected}")]
    VersionMismatch {
        order_id: OrderId,
        expected: i64,
        actual: i64,
    },

    #[error("order {0} is cancelled")]
    Canceled(OrderId),

    #[error("order {0} has already shipped")]
    AlreadyShipped(OrderId),
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_state", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Placed,
    Shipped,
    Cancel,
}

/// Result of the discount calculation, stored with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    /// Σ line amounts before any discount.
    pub subtotal: Money,
    pub grade_discount: Money,
    pub coupon_discount: Money,
    /// What the member pays.
    pub payable: Money,
    pub method: Option<String>,
}

/// Something that happened to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    OrderPlaced { order_id: OrderId, payable: Money },
    #[serde(rename_all = "camelCase")]
    ShippingInfoChanged {
        order_id: OrderId,
        shipping_info: ShippingInfo,
    },
    #[serde(rename_all = "camelCase")]
    ShippingStarted { order_id: OrderId },
    #[serde(rename_all = "camelCase")]
    OrderCanceled { order_id: OrderId },
}

impl OrderEvent {
    /// Order the event belongs to.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::OrderPlaced { order_id, .. }
            | Self::ShippingInfoChanged { order_id, .. }
            | Self::ShippingStarted { order_id }
            | Self::OrderCanceled { order_id } => *order_id,
        }
    }
}

/// Order header. Lines are stored and loaded separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// Optimistic concurrency token, bumped on every stored change.
    pub version: i64,
    pub orderer: Orderer,
    pub shipping_info: ShippingInfo,
    pub message: Option<String>,
    pub state: OrderState,
    pub payment_info: PaymentInfo,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether `version` is the version this order was loaded at.
    #[must_use]
    pub const fn matches_version(&self, version: i64) -> bool {
        self.version == version
    }

    /// Replace the shipping info before shipment.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Canceled` or `OrderError::AlreadyShipped` unless the
    /// order is still `PLACED`.
    pub fn change_shipping_info(
        &mut self,
        shipping_info: ShippingInfo,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        self.shipping_info = shipping_info.clone();
        Ok(vec![OrderEvent::ShippingInfoChanged {
            order_id: self.id,
            shipping_info,
        }])
    }

    /// Replace the shipping info on any order that is not cancelled.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Canceled` if the order is cancelled.
    pub fn update_shipping_info(&mut self, shipping_info: ShippingInfo) -> Result<(), OrderError> {
        if self.state == OrderState::Cancel {
            return Err(OrderError::Canceled(self.id));
        }
        self.shipping_info = shipping_info;
        Ok(())
    }

    /// Move a placed order to `SHIPPED`.
    ///
    /// The version is checked before the state so a stale caller always sees
    /// a conflict.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::VersionMismatch` on a stale version, otherwise
    /// `OrderError::Canceled`/`OrderError::AlreadyShipped` unless `PLACED`.
    pub fn start_shipping(&mut self, expected_version: i64) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.matches_version(expected_version) {
            return Err(OrderError::VersionMismatch {
                order_id: self.id,
                expected: expected_version,
                actual: self.version,
            });
        }
        self.ensure_placed()?;
        self.state = OrderState::Shipped;
        Ok(vec![OrderEvent::ShippingStarted { order_id: self.id }])
    }

    /// Cancel the order.
    ///
    /// Cancelling a cancelled order is a no-op that yields no events.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AlreadyShipped` if the order has shipped.
    pub fn cancel(&mut self) -> Result<Vec<OrderEvent>, OrderError> {
        match self.state {
            OrderState::Cancel => Ok(Vec::new()),
            OrderState::Shipped => Err(OrderError::AlreadyShipped(self.id)),
            OrderState::Placed => {
                self.state = OrderState::Cancel;
                Ok(vec![OrderEvent::OrderCanceled { order_id: self.id }])
            }
        }
    }

    const fn ensure_placed(&self) -> Result<(), OrderError> {
        match self.state {
            OrderState::Placed => Ok(()),
            OrderState::Shipped => Err(OrderError::AlreadyShipped(self.id)),
            OrderState::Cancel => Err(OrderError::Canceled(self.id)),
        }
    }
}

/// An order that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub orderer: Orderer,
    pub shipping_info: ShippingInfo,
    pub message: Option<String>,
    pub payment_info: PaymentInfo,
}

/// A stored order line. Price and amount are snapshots taken at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub price: Money,
    pub quantity: u32,
    pub amounts: Money,
}

/// Largest line amount or order total that can be stored: 999,999,999,999.99,
/// the ceiling of a `NUMERIC(14,2)` column.
pub const MAX_AMOUNT: Money = Money::new(Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2));

/// An order line priced from the catalog, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub price: Money,
    pub quantity: u32,
}

impl NewOrderLine {
    #[must_use]
    pub const fn new(product_id: ProductId, price: Money, quantity: u32) -> Self {
        Self {
            product_id,
            price,
            quantity,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.price.times(self.quantity)
    }
}
