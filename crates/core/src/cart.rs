//! Cart lines.
//!
//! A member has at most one cart line per product. Adding a product that is
//! already in the cart grows the existing line instead of creating another.

use crate::types::{CartId, MemberId, ProductId};

/// Errors raised by cart quantity rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity is zero, negative or larger than a line can hold.
    #[error("quantity must be between 1 and {max}, got {got}")]
    InvalidQuantity {
        /// The rejected value.
        got: i64,
        /// Largest accepted quantity.
        max: u32,
    },
    /// Adding to the line would overflow its quantity.
    #[error("cart line quantity would exceed {max}")]
    QuantityOverflow {
        /// Largest accepted quantity.
        max: u32,
    },
}

/// Largest quantity a single line may hold. Fits in a Postgres `INTEGER`.
pub const MAX_QUANTITY: u32 = 2_147_483_647;

/// Validate a client-supplied quantity.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` unless `1 <= quantity <= MAX_QUANTITY`.
pub fn checked_quantity(quantity: i64) -> Result<u32, CartError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_QUANTITY).contains(q))
        .ok_or(CartError::InvalidQuantity {
            got: quantity,
            max: MAX_QUANTITY,
        })
}

/// A persisted cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub member_id: MemberId,
    pub product_id: ProductId,
    quantity: u32,
}

impl Cart {
    /// Rehydrate a stored line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if the stored quantity is not positive.
    pub fn from_parts(
        id: CartId,
        member_id: MemberId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Self, CartError> {
        Ok(Self {
            id,
            member_id,
            product_id,
            quantity: checked_quantity(quantity)?,
        })
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Grow the line by `quantity` units.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityOverflow` if the sum would exceed `MAX_QUANTITY`.
    pub fn add_quantity(&mut self, quantity: u32) -> Result<(), CartError> {
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .filter(|q| *q <= MAX_QUANTITY)
            .ok_or(CartError::QuantityOverflow { max: MAX_QUANTITY })?;
        Ok(())
    }

    /// Replace the quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` unless the new quantity is positive.
    pub fn change_quantity(&mut self, quantity: i64) -> Result<(), CartError> {
        self.quantity = checked_quantity(quantity)?;
        Ok(())
    }
}

/// A cart line that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCart {
    pub member_id: MemberId,
    pub product_id: ProductId,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: i64) -> Cart {
        Cart::from_parts(CartId::new(1), MemberId::new(1), ProductId::new(1), quantity).unwrap()
    }

    #[test]
    fn test_checked_quantity_bounds() {
        assert_eq!(checked_quantity(1), Ok(1));
        assert!(checked_quantity(0).is_err());
        assert!(checked_quantity(-3).is_err());
        assert!(checked_quantity(i64::from(MAX_QUANTITY) + 1).is_err());
    }

    #[test]
    fn test_add_quantity_accumulates() {
        let mut cart = line(2);
        cart.add_quantity(3).unwrap();
        assert_eq!(cart.quantity(), 5);
    }

    #[test]
    fn test_add_quantity_overflow_leaves_line_unchanged() {
        let mut cart = line(i64::from(MAX_QUANTITY));
        assert_eq!(
            cart.add_quantity(1),
            Err(CartError::QuantityOverflow { max: MAX_QUANTITY })
        );
        assert_eq!(cart.quantity(), MAX_QUANTITY);
    }

    #[test]
    fn test_change_quantity_replaces() {
        let mut cart = line(7);
        cart.change_quantity(2).unwrap();
        assert_eq!(cart.quantity(), 2);
    }

    #[test]
    fn test_change_quantity_rejects_zero() {
        let mut cart = line(7);
        assert!(cart.change_quantity(0).is_err());
        assert_eq!(cart.quantity(), 7);
    }
}
