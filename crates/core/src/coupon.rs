//! Coupons.
//!
//! A [`CouponDefinition`] is a reusable template. Registering it for a member
//! issues a [`UserCoupon`], which carries its own used flag and can be spent
//! exactly once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CouponDefinitionId, MemberId, Money, UserCouponId};

/// Errors raised by coupon rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("coupon {0} has already been used")]
    AlreadyUsed(UserCouponId),

    #[error("ratio must be between 0 and 100 percent, got {0}")]
    RatioOutOfRange(Decimal),

    #[error("fixed discount cannot be negative, got {0}")]
    NegativeAmount(Money),
}

/// How a coupon reduces the amount it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponDiscount {
    /// Percentage of the running amount.
    Ratio(Decimal),
    /// Flat amount off.
    Fixed(Money),
}

impl CouponDiscount {
    /// Check the value is in range for its shape.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::RatioOutOfRange` or `CouponError::NegativeAmount`.
    pub fn validate(self) -> Result<Self, CouponError> {
        match self {
            Self::Ratio(ratio) if ratio < Decimal::ZERO || ratio > Decimal::ONE_HUNDRED => {
                Err(CouponError::RatioOutOfRange(ratio))
            }
            Self::Fixed(amount) if amount.is_negative() => Err(CouponError::NegativeAmount(amount)),
            valid => Ok(valid),
        }
    }

    /// Split into the `(is_ratio, ratio, fixed_amount)` column triple.
    #[must_use]
    pub fn into_columns(self) -> (bool, Decimal, Money) {
        match self {
            Self::Ratio(ratio) => (true, ratio, Money::ZERO),
            Self::Fixed(amount) => (false, Decimal::ZERO, amount),
        }
    }

    /// Rebuild from the `(is_ratio, ratio, fixed_amount)` column triple.
    #[must_use]
    pub const fn from_columns(is_ratio: bool, ratio: Decimal, fixed_amount: Money) -> Self {
        if is_ratio {
            Self::Ratio(ratio)
        } else {
            Self::Fixed(fixed_amount)
        }
    }
}

/// A coupon template that can be issued to members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDefinition {
    pub id: CouponDefinitionId,
    pub name: String,
    pub discount: CouponDiscount,
}

/// A coupon issued to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCoupon {
    pub id: UserCouponId,
    pub member_id: MemberId,
    pub definition_id: CouponDefinitionId,
    pub name: String,
    pub used: bool,
    pub discount: CouponDiscount,
}

impl UserCoupon {
    /// Spend the coupon.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::AlreadyUsed` if it was spent before.
    pub const fn mark_used(&mut self) -> Result<(), CouponError> {
        if self.used {
            return Err(CouponError::AlreadyUsed(self.id));
        }
        self.used = true;
        Ok(())
    }

    /// Overwrite the member-editable fields.
    ///
    /// A spent coupon stays spent.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::AlreadyUsed` when asked to clear the used flag of
    /// a spent coupon; nothing is changed in that case.
    pub fn update(&mut self, name: String, used: bool) -> Result<(), CouponError> {
        if self.used && !used {
            return Err(CouponError::AlreadyUsed(self.id));
        }
        self.name = name;
        self.used = used;
        Ok(())
    }

    /// Replace the discount shape and value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is out of range for its shape.
    pub fn change_discount(&mut self, discount: CouponDiscount) -> Result<(), CouponError> {
        self.discount = discount.validate()?;
        Ok(())
    }
}

/// A coupon instance that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserCoupon {
    pub member_id: MemberId,
    pub definition_id: CouponDefinitionId,
    pub name: String,
    pub discount: CouponDiscount,
}

impl NewUserCoupon {
    /// Issue `definition` to `member_id`.
    #[must_use]
    pub fn issue(definition: &CouponDefinition, member_id: MemberId) -> Self {
        Self {
            member_id,
            definition_id: definition.id,
            name: definition.name.clone(),
            discount: definition.discount,
        }
    }
}
