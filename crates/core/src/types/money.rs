//! Type-safe money representation using decimal arithmetic.
//!
//! All amounts are in the shop's single currency. Intermediate results of
//! percentage calculations are truncated toward zero at two decimal places.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places kept after percentage calculations.
const SCALE: u32 = 2;

/// A monetary amount.
///
/// Serialized as a decimal string (`"19.99"`) so clients never see float
/// rounding artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// `percent`% of this amount, truncated to two decimal places.
    #[must_use]
    pub fn percent(self, percent: Decimal) -> Self {
        Self(
            (self.0 * percent / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(SCALE, RoundingStrategy::ToZero),
        )
    }

    /// Subtract, clamping the result at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Plain subtraction; callers guarantee `other <= self`.
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times() {
        assert_eq!(Money::from_units(1000).times(2), Money::from_units(2000));
        assert_eq!(Money::from_units(1000).times(0), Money::ZERO);
    }

    #[test]
    fn test_percent_truncates() {
        // 3% of 33.33 = 0.9999
        let amount = Money::new(Decimal::new(3333, 2));
        assert_eq!(amount.percent(Decimal::from(3)), Money::new(Decimal::new(99, 2)));
    }

    #[test]
    fn test_saturating_sub_clamps_at_zero() {
        let small = Money::from_units(5);
        let big = Money::from_units(10);
        assert_eq!(small.saturating_sub(big), Money::ZERO);
        assert_eq!(big.saturating_sub(small), Money::from_units(5));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_units(1), Money::from_units(2)].into_iter().sum();
        assert_eq!(total, Money::from_units(3));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::new(Decimal::new(1999, 2))).ok();
        assert_eq!(json.as_deref(), Some("\"19.99\""));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Money::from_units(20).to_string(), "20.00");
    }
}
