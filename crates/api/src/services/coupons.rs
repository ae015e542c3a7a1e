//! Coupon ledger.
//!
//! Coupons are issued per member from a [`CouponDefinition`] template and
//! spent at most once by order placement.
//!
//! [`CouponDefinition`]: bazaar_core::coupon::CouponDefinition

use tracing::instrument;

use bazaar_core::coupon::{CouponDiscount, NewUserCoupon, UserCoupon};
use bazaar_core::{CouponDefinitionId, MemberId, UserCouponId};

use super::ServiceError;
use crate::db::{CouponRepository, Database, MemberRepository, UnitOfWork};

/// Replacement values for an issued coupon.
#[derive(Debug, Clone)]
pub struct CouponUpdate {
    pub id: UserCouponId,
    pub name: String,
    pub used: bool,
}

pub struct CouponService<'a, D: Database> {
    db: &'a D,
}

impl<'a, D: Database> CouponService<'a, D> {
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Coupons the member can still spend.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    pub async fn list_unused(&self, member_id: MemberId) -> Result<Vec<UserCoupon>, ServiceError> {
        let mut uow = self.db.begin().await?;
        Ok(uow.list_unused_coupons_for_member(member_id).await?)
    }

    /// Issue a coupon from a definition to a member.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the definition or member is missing.
    #[instrument(skip(self))]
    pub async fn register(
        &self,
        member_id: MemberId,
        definition_id: CouponDefinitionId,
    ) -> Result<UserCouponId, ServiceError> {
        let mut uow = self.db.begin().await?;
        let definition = uow
            .find_coupon_definition(definition_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("coupon definition", definition_id))?;
        uow.find_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("member", member_id))?;

        let coupon = uow
            .insert_user_coupon(NewUserCoupon::issue(&definition, member_id))
            .await?;
        uow.commit().await?;

        tracing::info!(coupon_id = %coupon.id, "Coupon issued");
        Ok(coupon.id)
    }

    /// Overwrite name and used flag of one of the member's coupons.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the coupon is missing or owned by
    /// another member, `ServiceError::CouponAlreadyUsed` when trying to clear
    /// the used flag of a spent coupon.
    #[instrument(skip(self, update), fields(coupon_id = %update.id))]
    pub async fn update(
        &self,
        member_id: MemberId,
        update: CouponUpdate,
    ) -> Result<UserCoupon, ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut coupon = uow
            .find_user_coupon(update.id)
            .await?
            .filter(|coupon| coupon.member_id == member_id)
            .ok_or_else(|| ServiceError::not_found("coupon", update.id))?;

        coupon.update(update.name, update.used)?;
        uow.update_user_coupon(&coupon).await?;
        uow.commit().await?;

        Ok(coupon)
    }

    /// Replace the discount of an issued coupon. Back-office only; no
    /// ownership check.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the coupon is missing,
    /// `ServiceError::Validation` for an out-of-range discount.
    #[instrument(skip(self))]
    pub async fn change_discount(
        &self,
        coupon_id: UserCouponId,
        discount: CouponDiscount,
    ) -> Result<UserCoupon, ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut coupon = uow
            .find_user_coupon(coupon_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("coupon", coupon_id))?;

        coupon.change_discount(discount)?;
        uow.update_user_coupon(&coupon).await?;
        uow.commit().await?;

        tracing::info!(%coupon_id, "Coupon discount changed");
        Ok(coupon)
    }

    /// Delete one of the member's coupons. Anything else is left alone.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        member_id: MemberId,
        coupon_id: UserCouponId,
    ) -> Result<(), ServiceError> {
        let mut uow = self.db.begin().await?;
        let owned = uow
            .find_user_coupon(coupon_id)
            .await?
            .is_some_and(|coupon| coupon.member_id == member_id);
        if owned {
            uow.delete_user_coupon(coupon_id).await?;
            uow.commit().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use bazaar_core::member::NewMember;
    use bazaar_core::{Money, Username};

    use super::*;
    use crate::db::memory::MemoryDatabase;

    async fn seed(db: &MemoryDatabase) -> (MemberId, MemberId, CouponDefinitionId) {
        let mut uow = db.begin().await.unwrap();
        let mut ids = Vec::new();
        for username in ["alice", "bob"] {
            let member = uow
                .insert_member(NewMember {
                    username: Username::parse(username).unwrap(),
                    name: username.to_owned(),
                    address: None,
                    password_hash: String::new(),
                })
                .await
                .unwrap();
            ids.push(member.id);
        }
        let definition = uow
            .insert_coupon_definition("WELCOME10", CouponDiscount::Ratio(Decimal::from(10)))
            .await
            .unwrap();
        uow.commit().await.unwrap();
        (ids[0], ids[1], definition.id)
    }

    #[tokio::test]
    async fn test_register_then_list_unused() {
        let db = MemoryDatabase::new();
        let (alice, bob, welcome) = seed(&db).await;
        let coupons = CouponService::new(&db);

        let id = coupons.register(alice, welcome).await.unwrap();

        let unused = coupons.list_unused(alice).await.unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].id, id);
        assert_eq!(unused[0].name, "WELCOME10");
        assert!(coupons.list_unused(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_unknown_definition() {
        let db = MemoryDatabase::new();
        let (alice, _, _) = seed(&db).await;

        let err = CouponService::new(&db)
            .register(alice, CouponDefinitionId::new(9999))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_marking_used_hides_coupon() {
        let db = MemoryDatabase::new();
        let (alice, _, welcome) = seed(&db).await;
        let coupons = CouponService::new(&db);
        let id = coupons.register(alice, welcome).await.unwrap();

        coupons
            .update(
                alice,
                CouponUpdate {
                    id,
                    name: "WELCOME10".to_owned(),
                    used: true,
                },
            )
            .await
            .unwrap();

        assert!(coupons.list_unused(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spent_coupon_cannot_be_unspent() {
        let db = MemoryDatabase::new();
        let (alice, _, welcome) = seed(&db).await;
        let coupons = CouponService::new(&db);
        let id = coupons.register(alice, welcome).await.unwrap();
        let spend = |used| CouponUpdate {
            id,
            name: "WELCOME10".to_owned(),
            used,
        };
        coupons.update(alice, spend(true)).await.unwrap();

        let err = coupons.update(alice, spend(false)).await.unwrap_err();

        assert!(matches!(err, ServiceError::CouponAlreadyUsed(c) if c == id));
        assert!(coupons.list_unused(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_change_discount() {
        let db = MemoryDatabase::new();
        let (alice, _, welcome) = seed(&db).await;
        let coupons = CouponService::new(&db);
        let id = coupons.register(alice, welcome).await.unwrap();

        let changed = coupons
            .change_discount(id, CouponDiscount::Fixed(Money::from_units(500)))
            .await
            .unwrap();

        assert_eq!(changed.discount, CouponDiscount::Fixed(Money::from_units(500)));
        assert_eq!(
            coupons.list_unused(alice).await.unwrap()[0].discount,
            CouponDiscount::Fixed(Money::from_units(500))
        );
    }

    #[tokio::test]
    async fn test_change_discount_rejects_out_of_range_values() {
        let db = MemoryDatabase::new();
        let (alice, _, welcome) = seed(&db).await;
        let coupons = CouponService::new(&db);
        let id = coupons.register(alice, welcome).await.unwrap();

        for discount in [
            CouponDiscount::Fixed(Money::from_units(-5)),
            CouponDiscount::Ratio(Decimal::from(150)),
        ] {
            let err = coupons.change_discount(id, discount).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        assert_eq!(
            coupons.list_unused(alice).await.unwrap()[0].discount,
            CouponDiscount::Ratio(Decimal::from(10))
        );

        let err = coupons
            .change_discount(UserCouponId::new(9999), CouponDiscount::Ratio(Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_other_members_coupon_is_not_found_and_not_deleted() {
        let db = MemoryDatabase::new();
        let (alice, bob, welcome) = seed(&db).await;
        let coupons = CouponService::new(&db);
        let id = coupons.register(alice, welcome).await.unwrap();

        let err = coupons
            .update(
                bob,
                CouponUpdate {
                    id,
                    name: "MINE".to_owned(),
                    used: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        coupons.delete(bob, id).await.unwrap();
        assert_eq!(coupons.list_unused(alice).await.unwrap().len(), 1);

        coupons.delete(alice, id).await.unwrap();
        assert!(coupons.list_unused(alice).await.unwrap().is_empty());
    }
}
