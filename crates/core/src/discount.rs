//! Payment calculation.
//!
//! Precedence is fixed:
//!
//! 1. `subtotal = Σ price × quantity`
//! 2. the member grade rate comes off the subtotal
//! 3. ratio coupons apply to the running amount, lowest coupon id first
//! 4. fixed coupons come off next, lowest coupon id first
//!
//! Every percentage is truncated to two decimal places and the running amount
//! never drops below zero.

use std::collections::HashSet;

use crate::coupon::{CouponDiscount, UserCoupon};
use crate::order::{NewOrderLine, PaymentInfo};
use crate::types::{MemberGrade, Money, UserCouponId};

/// Reasons a coupon set cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("coupon {0} has already been used")]
    CouponAlreadyUsed(UserCouponId),

    #[error("coupon {0} was supplied more than once")]
    DuplicateCoupon(UserCouponId),
}

/// Compute what an order costs.
///
/// # Errors
///
/// Returns `DiscountError::CouponAlreadyUsed` if any coupon is spent, or
/// `DiscountError::DuplicateCoupon` if the same coupon appears twice.
pub fn calculate(
    lines: &[NewOrderLine],
    grade: MemberGrade,
    coupons: &[UserCoupon],
    method: Option<String>,
) -> Result<PaymentInfo, DiscountError> {
    let mut seen = HashSet::with_capacity(coupons.len());
    for coupon in coupons {
        if !seen.insert(coupon.id) {
            return Err(DiscountError::DuplicateCoupon(coupon.id));
        }
        if coupon.used {
            return Err(DiscountError::CouponAlreadyUsed(coupon.id));
        }
    }

    let subtotal: Money = lines.iter().map(NewOrderLine::amount).sum();
    let grade_discount = subtotal.percent(grade.discount_percent());
    let after_grade = subtotal.saturating_sub(grade_discount);

    let mut ordered: Vec<&UserCoupon> = coupons.iter().collect();
    ordered.sort_by_key(|c| (matches!(c.discount, CouponDiscount::Fixed(_)), c.id));

    let payable = ordered
        .into_iter()
        .fold(after_grade, |running, coupon| match coupon.discount {
            CouponDiscount::Ratio(ratio) => running.saturating_sub(running.percent(ratio)),
            CouponDiscount::Fixed(amount) => running.saturating_sub(amount),
        });

    Ok(PaymentInfo {
        subtotal,
        grade_discount,
        coupon_discount: after_grade.minus(payable),
        payable,
        method,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::{CouponDefinitionId, MemberId, ProductId};

    fn line(price: i64, quantity: u32) -> NewOrderLine {
        NewOrderLine::new(ProductId::new(1), Money::from_units(price), quantity)
    }

    fn coupon(id: i32, discount: CouponDiscount) -> UserCoupon {
        UserCoupon {
            id: UserCouponId::new(id),
            member_id: MemberId::new(1),
            definition_id: CouponDefinitionId::new(1),
            name: format!("C{id}"),
            used: false,
            discount,
        }
    }

    #[test]
    fn test_standard_grade_no_coupons() {
        let info = calculate(&[line(1000, 2)], MemberGrade::Standard, &[], None).unwrap();
        assert_eq!(info.subtotal, Money::from_units(2000));
        assert_eq!(info.grade_discount, Money::ZERO);
        assert_eq!(info.coupon_discount, Money::ZERO);
        assert_eq!(info.payable, Money::from_units(2000));
    }

    #[test]
    fn test_grade_discount_applies_before_coupons() {
        // 10000 - 10% (vip) = 9000; 10% ratio coupon on 9000 = 900 -> 8100
        let coupons = [coupon(1, CouponDiscount::Ratio(Decimal::from(10)))];
        let info = calculate(&[line(10_000, 1)], MemberGrade::Vip, &coupons, None).unwrap();
        assert_eq!(info.grade_discount, Money::from_units(1000));
        assert_eq!(info.coupon_discount, Money::from_units(900));
        assert_eq!(info.payable, Money::from_units(8100));
    }

    #[test]
    fn test_ratio_before_fixed_regardless_of_input_order() {
        // 10000 -> ratio 50% = 5000 -> fixed 1000 = 4000
        let coupons = [
            coupon(1, CouponDiscount::Fixed(Money::from_units(1000))),
            coupon(2, CouponDiscount::Ratio(Decimal::from(50))),
        ];
        let info = calculate(&[line(10_000, 1)], MemberGrade::Standard, &coupons, None).unwrap();
        assert_eq!(info.payable, Money::from_units(4000));
        assert_eq!(info.coupon_discount, Money::from_units(6000));
    }

    #[test]
    fn test_payable_never_negative() {
        let coupons = [coupon(1, CouponDiscount::Fixed(Money::from_units(5000)))];
        let info = calculate(&[line(1000, 1)], MemberGrade::Gold, &coupons, None).unwrap();
        assert_eq!(info.payable, Money::ZERO);
        assert_eq!(info.coupon_discount, Money::from_units(950));
    }

    #[test]
    fn test_grade_percentage_truncates() {
        // 2% of 333 = 6.66
        let info = calculate(&[line(333, 1)], MemberGrade::Silver, &[], None).unwrap();
        assert_eq!(info.grade_discount, Money::new(Decimal::new(666, 2)));
        assert_eq!(info.payable, Money::new(Decimal::new(32634, 2)));
    }

    #[test]
    fn test_used_coupon_rejected() {
        let mut spent = coupon(4, CouponDiscount::Fixed(Money::from_units(100)));
        spent.used = true;
        assert_eq!(
            calculate(&[line(1000, 1)], MemberGrade::Standard, &[spent], None),
            Err(DiscountError::CouponAlreadyUsed(UserCouponId::new(4)))
        );
    }

    #[test]
    fn test_duplicate_coupon_rejected() {
        let c = coupon(4, CouponDiscount::Fixed(Money::from_units(100)));
        assert_eq!(
            calculate(&[line(1000, 1)], MemberGrade::Standard, &[c.clone(), c], None),
            Err(DiscountError::DuplicateCoupon(UserCouponId::new(4)))
        );
    }

    #[test]
    fn test_payment_method_recorded() {
        let info = calculate(
            &[line(1, 1)],
            MemberGrade::Standard,
            &[],
            Some("CARD".to_string()),
        )
        .unwrap();
        assert_eq!(info.method.as_deref(), Some("CARD"));
    }
}
