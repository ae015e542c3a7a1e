//! Coupon definition and issued-coupon management.
//!
//! Definitions have no HTTP surface; members register coupons from the
//! definitions created here. The discount of an issued coupon is likewise
//! only changed from here.

use rust_decimal::Decimal;

use bazaar_api::db::{CouponRepository, Database, UnitOfWork, postgres::PgDatabase};
use bazaar_api::services::coupons::CouponService;
use bazaar_core::{Money, UserCouponId};
use bazaar_core::coupon::CouponDiscount;

use super::{CommandError, connect};

/// Build the discount shape from the mutually exclusive CLI flags.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` unless exactly one flag is set, or
/// `CommandError::Coupon` if the value is out of range.
pub fn discount_from_args(
    ratio: Option<Decimal>,
    fixed: Option<i64>,
) -> Result<CouponDiscount, CommandError> {
    let discount = match (ratio, fixed) {
        (Some(ratio), None) => CouponDiscount::Ratio(ratio),
        (None, Some(amount)) => CouponDiscount::Fixed(Money::from_units(amount)),
        _ => {
            return Err(CommandError::InvalidArgument(
                "exactly one of --ratio or --fixed is required".to_string(),
            ));
        }
    };
    Ok(discount.validate()?)
}

/// Create a coupon definition.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the insert fails.
pub async fn create(
    name: &str,
    ratio: Option<Decimal>,
    fixed: Option<i64>,
) -> Result<(), CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::InvalidArgument(
            "name cannot be blank".to_string(),
        ));
    }
    let discount = discount_from_args(ratio, fixed)?;

    let db = PgDatabase::new(connect().await?);
    let mut uow = db.begin().await?;
    let definition = uow.insert_coupon_definition(name, discount).await?;
    uow.commit().await?;

    tracing::info!(
        id = %definition.id,
        name = %definition.name,
        discount = ?definition.discount,
        "Coupon definition created"
    );
    Ok(())
}

/// Replace the discount of an issued coupon.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the coupon does not exist
/// or the update fails.
pub async fn reprice(
    id: i32,
    ratio: Option<Decimal>,
    fixed: Option<i64>,
) -> Result<(), CommandError> {
    let discount = discount_from_args(ratio, fixed)?;

    let db = PgDatabase::new(connect().await?);
    let coupon = CouponService::new(&db)
        .change_discount(UserCouponId::new(id), discount)
        .await?;

    tracing::info!(
        id = %coupon.id,
        member_id = %coupon.member_id,
        discount = ?coupon.discount,
        "Coupon repriced"
    );
    Ok(())
}
