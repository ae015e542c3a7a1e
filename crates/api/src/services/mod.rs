//! Business logic services.
//!
//! Each service is a short-lived borrow of the shared [`Database`] built per
//! request (`CartService::new(state.db())`). Every public operation opens one
//! unit of work and commits it once at the end; an early return drops the
//! unit of work and nothing is persisted.
//!
//! # Services
//!
//! - `auth` - Member registration, sign-in and access tokens
//! - `carts` - Cart lines scoped to a member
//! - `catalog` - Product and category display records
//! - `coupons` - Coupon ledger scoped to a member
//! - `orders` - Order placement and the order state machine
//!
//! [`Database`]: crate::db::Database

pub mod auth;
pub mod carts;
pub mod catalog;
pub mod coupons;
pub mod orders;

use core::fmt;

use serde::Serialize;
use thiserror::Error;

use bazaar_core::UserCouponId;
use bazaar_core::cart::CartError;
use bazaar_core::coupon::CouponError;
use bazaar_core::discount::DiscountError;
use bazaar_core::order::OrderError;

use crate::db::RepositoryError;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Offending property, or `None` for an error about the request as a whole.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub code: String,
}

impl ValidationError {
    #[must_use]
    pub fn of(property: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            code: code.into(),
        }
    }

    #[must_use]
    pub fn global(code: impl Into<String>) -> Self {
        Self {
            property: None,
            code: code.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) => write!(f, "{property}: {}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Errors raised by shop operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Every violation found in the request, not just the first.
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<ValidationError>),

    /// The caller's view of an order is stale; re-fetch and retry.
    #[error("version conflict: {0}")]
    VersionConflict(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("coupon {0} has already been used")]
    CouponAlreadyUsed(UserCouponId),

    #[error("coupon {0} was supplied more than once")]
    DuplicateCoupon(UserCouponId),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn join_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::VersionMismatch { .. } => Self::VersionConflict(err.to_string()),
            OrderError::Canceled(_) | OrderError::AlreadyShipped(_) => {
                Self::IllegalState(err.to_string())
            }
        }
    }
}

impl From<DiscountError> for ServiceError {
    fn from(err: DiscountError) -> Self {
        match err {
            DiscountError::CouponAlreadyUsed(id) => Self::CouponAlreadyUsed(id),
            DiscountError::DuplicateCoupon(id) => Self::DuplicateCoupon(id),
        }
    }
}

impl From<CartError> for ServiceError {
    fn from(err: CartError) -> Self {
        let code = match err {
            CartError::InvalidQuantity { .. } => "out_of_range",
            CartError::QuantityOverflow { .. } => "overflow",
        };
        Self::Validation(vec![ValidationError::of("quantity", code)])
    }
}

impl From<CouponError> for ServiceError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::AlreadyUsed(id) => Self::CouponAlreadyUsed(id),
            CouponError::RatioOutOfRange(_) => {
                Self::Validation(vec![ValidationError::of("ratio", "out_of_range")])
            }
            CouponError::NegativeAmount(_) => {
                Self::Validation(vec![ValidationError::of("fixedAmount", "negative")])
            }
        }
    }
}

/// Map a stale order write to `ServiceError::VersionConflict`.
pub(crate) fn order_write_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(msg) => ServiceError::VersionConflict(msg),
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use bazaar_core::OrderId;

    use super::*;

    #[test]
    fn test_validation_message_lists_every_violation() {
        let err = ServiceError::Validation(vec![
            ValidationError::of("orderer", "empty"),
            ValidationError::of("shippingInfo", "empty"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: orderer: empty, shippingInfo: empty"
        );
    }

    #[test]
    fn test_order_errors_map_to_taxonomy() {
        let stale = OrderError::VersionMismatch {
            order_id: OrderId::new(1),
            expected: 1,
            actual: 2,
        };
        assert!(matches!(
            ServiceError::from(stale),
            ServiceError::VersionConflict(_)
        ));
        assert!(matches!(
            ServiceError::from(OrderError::Canceled(OrderId::new(1))),
            ServiceError::IllegalState(_)
        ));
    }

    #[test]
    fn test_conflicting_order_write_is_version_conflict() {
        let err = order_write_error(RepositoryError::Conflict("stale".to_owned()));
        assert!(matches!(err, ServiceError::VersionConflict(_)));
    }
}
