//! Member grade and its discount rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Loyalty grade of a member.
///
/// Each grade carries a fixed percentage discount applied to the order
/// subtotal before any coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "member_grade", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberGrade {
    #[default]
    Standard,
    Silver,
    Gold,
    Vip,
}

impl MemberGrade {
    /// Discount rate in percent.
    #[must_use]
    pub fn discount_percent(self) -> Decimal {
        match self {
            Self::Standard => Decimal::ZERO,
            Self::Silver => Decimal::from(2),
            Self::Gold => Decimal::from(5),
            Self::Vip => Decimal::from(10),
        }
    }
}
