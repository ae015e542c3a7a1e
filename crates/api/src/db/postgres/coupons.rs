//! Coupon queries.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;

use bazaar_core::coupon::{CouponDefinition, CouponDiscount, NewUserCoupon, UserCoupon};
use bazaar_core::{CouponDefinitionId, MemberId, Money, UserCouponId};

use super::PgUnitOfWork;
use crate::db::{CouponRepository, RepositoryError, conflict_on_unique};

const USER_COUPON_COLUMNS: &str =
    "id, member_id, definition_id, name, is_used, is_ratio, ratio, fixed_amount";

#[derive(FromRow)]
struct DefinitionRow {
    id: CouponDefinitionId,
    name: String,
    is_ratio: bool,
    ratio: Decimal,
    fixed_amount: Money,
}

impl From<DefinitionRow> for CouponDefinition {
    fn from(row: DefinitionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            discount: CouponDiscount::from_columns(row.is_ratio, row.ratio, row.fixed_amount),
        }
    }
}

#[derive(FromRow)]
struct UserCouponRow {
    id: UserCouponId,
    member_id: MemberId,
    definition_id: CouponDefinitionId,
    name: String,
    is_used: bool,
    is_ratio: bool,
    ratio: Decimal,
    fixed_amount: Money,
}

impl From<UserCouponRow> for UserCoupon {
    fn from(row: UserCouponRow) -> Self {
        Self {
            id: row.id,
            member_id: row.member_id,
            definition_id: row.definition_id,
            name: row.name,
            used: row.is_used,
            discount: CouponDiscount::from_columns(row.is_ratio, row.ratio, row.fixed_amount),
        }
    }
}

#[async_trait]
impl CouponRepository for PgUnitOfWork {
    async fn find_coupon_definition(
        &mut self,
        id: CouponDefinitionId,
    ) -> Result<Option<CouponDefinition>, RepositoryError> {
        let row = sqlx::query_as::<_, DefinitionRow>(
            "SELECT id, name, is_ratio, ratio, fixed_amount FROM coupon_definitions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(CouponDefinition::from))
    }

    async fn insert_coupon_definition(
        &mut self,
        name: &str,
        discount: CouponDiscount,
    ) -> Result<CouponDefinition, RepositoryError> {
        let (is_ratio, ratio, fixed_amount) = discount.into_columns();
        let row = sqlx::query_as::<_, DefinitionRow>(
            "INSERT INTO coupon_definitions (name, is_ratio, ratio, fixed_amount) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, is_ratio, ratio, fixed_amount",
        )
        .bind(name)
        .bind(is_ratio)
        .bind(ratio)
        .bind(fixed_amount)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon definition"))?;

        Ok(row.into())
    }

    async fn find_user_coupon(
        &mut self,
        id: UserCouponId,
    ) -> Result<Option<UserCoupon>, RepositoryError> {
        let sql = format!("SELECT {USER_COUPON_COLUMNS} FROM user_coupons WHERE id = $1");
        let row = sqlx::query_as::<_, UserCouponRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(UserCoupon::from))
    }

    async fn find_user_coupons(
        &mut self,
        ids: &[UserCouponId],
    ) -> Result<Vec<UserCoupon>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(UserCouponId::as_i32).collect();
        // Locked so two orders cannot spend the same coupon.
        let sql = format!(
            "SELECT {USER_COUPON_COLUMNS} FROM user_coupons WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, UserCouponRow>(&sql)
            .bind(ids)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(UserCoupon::from).collect())
    }

    async fn list_unused_coupons_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<UserCoupon>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COUPON_COLUMNS} FROM user_coupons \
             WHERE member_id = $1 AND NOT is_used ORDER BY id"
        );
        let rows = sqlx::query_as::<_, UserCouponRow>(&sql)
            .bind(member_id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(UserCoupon::from).collect())
    }

    async fn insert_user_coupon(
        &mut self,
        coupon: NewUserCoupon,
    ) -> Result<UserCoupon, RepositoryError> {
        let (is_ratio, ratio, fixed_amount) = coupon.discount.into_columns();
        let sql = format!(
            "INSERT INTO user_coupons (member_id, definition_id, name, is_ratio, ratio, fixed_amount) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COUPON_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserCouponRow>(&sql)
            .bind(coupon.member_id)
            .bind(coupon.definition_id)
            .bind(&coupon.name)
            .bind(is_ratio)
            .bind(ratio)
            .bind(fixed_amount)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(row.into())
    }

    async fn update_user_coupon(&mut self, coupon: &UserCoupon) -> Result<(), RepositoryError> {
        let (is_ratio, ratio, fixed_amount) = coupon.discount.into_columns();
        let result = sqlx::query(
            "UPDATE user_coupons \
             SET name = $2, is_used = $3, is_ratio = $4, ratio = $5, fixed_amount = $6 \
             WHERE id = $1",
        )
        .bind(coupon.id)
        .bind(&coupon.name)
        .bind(coupon.used)
        .bind(is_ratio)
        .bind(ratio)
        .bind(fixed_amount)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_user_coupon(&mut self, id: UserCouponId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_coupons WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}
