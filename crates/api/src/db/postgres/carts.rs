//! Cart queries.

use async_trait::async_trait;
use sqlx::FromRow;

use bazaar_core::cart::{Cart, NewCart};
use bazaar_core::{CartId, MemberId, ProductId};

use super::{PgUnitOfWork, quantity_to_db};
use crate::db::{CartRepository, RepositoryError};

#[derive(FromRow)]
struct CartRow {
    id: CartId,
    member_id: MemberId,
    product_id: ProductId,
    quantity: i32,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Self::from_parts(row.id, row.member_id, row.product_id, i64::from(row.quantity))
            .map_err(|e| RepositoryError::DataCorruption(format!("cart {}: {e}", row.id)))
    }
}

#[async_trait]
impl CartRepository for PgUnitOfWork {
    async fn find_cart(&mut self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        sqlx::query_as::<_, CartRow>(
            "SELECT id, member_id, product_id, quantity FROM carts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(Cart::try_from)
        .transpose()
    }

    async fn find_cart_for_product(
        &mut self,
        member_id: MemberId,
        product_id: ProductId,
    ) -> Result<Option<Cart>, RepositoryError> {
        sqlx::query_as::<_, CartRow>(
            "SELECT id, member_id, product_id, quantity FROM carts \
             WHERE member_id = $1 AND product_id = $2 \
             FOR UPDATE",
        )
        .bind(member_id)
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(Cart::try_from)
        .transpose()
    }

    async fn list_carts_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<Cart>, RepositoryError> {
        sqlx::query_as::<_, CartRow>(
            "SELECT id, member_id, product_id, quantity FROM carts \
             WHERE member_id = $1 ORDER BY id",
        )
        .bind(member_id)
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(Cart::try_from)
        .collect()
    }

    async fn insert_cart(&mut self, cart: NewCart) -> Result<Cart, RepositoryError> {
        // A concurrent insert for the same pair folds into the existing row.
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (member_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (member_id, product_id) \
             DO UPDATE SET quantity = carts.quantity + EXCLUDED.quantity \
             RETURNING id, member_id, product_id, quantity",
        )
        .bind(cart.member_id)
        .bind(cart.product_id)
        .bind(quantity_to_db(cart.quantity)?)
        .fetch_one(&mut *self.tx)
        .await?;

        Cart::try_from(row)
    }

    async fn update_cart_quantity(&mut self, cart: &Cart) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE carts SET quantity = $2 WHERE id = $1")
            .bind(cart.id)
            .bind(quantity_to_db(cart.quantity())?)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_cart(&mut self, id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_carts_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}
