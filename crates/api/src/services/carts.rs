//! Cart manager.
//!
//! One row per (member, product). Adding a product that is already in the
//! cart grows the existing row. Display records resolve product details at
//! read time; nothing is snapshotted here.

use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use bazaar_core::cart::{Cart, NewCart, checked_quantity};
use bazaar_core::catalog::Product;
use bazaar_core::{CartId, MemberId, Money, ProductId};

use super::ServiceError;
use crate::db::{CartRepository, CatalogRepository, Database, MemberRepository, UnitOfWork};

/// Cart row as shown to the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartView {
    fn new(cart: &Cart, product: &Product) -> Self {
        Self {
            id: cart.id,
            product_id: product.id,
            product_name: product.title.clone(),
            price: product.price,
            image: product.thumbnail().map(str::to_owned),
            quantity: cart.quantity(),
        }
    }
}

/// Cart service scoped to the shared store.
pub struct CartService<'a, D: Database> {
    db: &'a D,
}

impl<'a, D: Database> CartService<'a, D> {
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Add `quantity` of a product to the member's cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the member or product is missing,
    /// `ServiceError::Validation` if the quantity is not positive or the row
    /// would overflow.
    #[instrument(skip(self))]
    pub async fn save(
        &self,
        member_id: MemberId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartId, ServiceError> {
        let quantity = checked_quantity(quantity)?;

        let mut uow = self.db.begin().await?;
        uow.find_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("member", member_id))?;
        uow.find_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))?;

        let id = match uow.find_cart_for_product(member_id, product_id).await? {
            Some(mut cart) => {
                cart.add_quantity(quantity)?;
                uow.update_cart_quantity(&cart).await?;
                cart.id
            }
            None => {
                uow.insert_cart(NewCart {
                    member_id,
                    product_id,
                    quantity,
                })
                .await?
                .id
            }
        };
        uow.commit().await?;

        Ok(id)
    }

    /// Overwrite the quantity of one of the member's cart rows.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the row is missing or owned by
    /// another member, `ServiceError::Validation` for a non-positive quantity.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        member_id: MemberId,
        cart_id: CartId,
        quantity: i64,
    ) -> Result<CartView, ServiceError> {
        let mut uow = self.db.begin().await?;
        let mut cart = uow
            .find_cart(cart_id)
            .await?
            .filter(|cart| cart.member_id == member_id)
            .ok_or_else(|| ServiceError::not_found("cart", cart_id))?;

        cart.change_quantity(quantity)?;
        uow.update_cart_quantity(&cart).await?;

        let product = uow
            .find_product(cart.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", cart.product_id))?;
        uow.commit().await?;

        Ok(CartView::new(&cart, &product))
    }

    /// Remove one cart row. Rows that are missing or owned by someone else
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    #[instrument(skip(self))]
    pub async fn delete(&self, member_id: MemberId, cart_id: CartId) -> Result<(), ServiceError> {
        let mut uow = self.db.begin().await?;
        let owned = uow
            .find_cart(cart_id)
            .await?
            .is_some_and(|cart| cart.member_id == member_id);
        if owned {
            uow.delete_cart(cart_id).await?;
            uow.commit().await?;
        }
        Ok(())
    }

    /// Empty the member's cart. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    #[instrument(skip(self))]
    pub async fn delete_all(&self, member_id: MemberId) -> Result<u64, ServiceError> {
        let mut uow = self.db.begin().await?;
        let removed = uow.delete_carts_for_member(member_id).await?;
        uow.commit().await?;
        Ok(removed)
    }

    /// All of the member's cart rows with current product details.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    pub async fn list(&self, member_id: MemberId) -> Result<Vec<CartView>, ServiceError> {
        let mut uow = self.db.begin().await?;
        let carts = uow.list_carts_for_member(member_id).await?;

        let product_ids: Vec<ProductId> = carts.iter().map(|cart| cart.product_id).collect();
        let products: HashMap<ProductId, Product> = uow
            .find_products(&product_ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        Ok(carts
            .iter()
            .filter_map(|cart| {
                let view = products.get(&cart.product_id).map(|p| CartView::new(cart, p));
                if view.is_none() {
                    tracing::warn!(cart_id = %cart.id, product_id = %cart.product_id, "Cart references missing product");
                }
                view
            })
            .collect())
    }
}
