//! Repository contracts implemented by every unit of work.

use async_trait::async_trait;

use bazaar_core::cart::{Cart, NewCart};
use bazaar_core::catalog::{Category, Product};
use bazaar_core::coupon::{CouponDefinition, CouponDiscount, NewUserCoupon, UserCoupon};
use bazaar_core::member::{Member, NewMember};
use bazaar_core::order::{NewOrder, NewOrderLine, Order, OrderLine};
use bazaar_core::{
    Address, CartId, CategoryId, CouponDefinitionId, MemberId, Money, OrderId, ProductId,
    UserCouponId,
};

use super::RepositoryError;

#[async_trait]
pub trait MemberRepository {
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError>;

    async fn find_member_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Member>, RepositoryError>;

    /// The member together with their stored password hash.
    async fn find_member_credentials(
        &mut self,
        username: &str,
    ) -> Result<Option<(Member, String)>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn insert_member(&mut self, member: NewMember) -> Result<Member, RepositoryError>;

    async fn update_member_address(
        &mut self,
        id: MemberId,
        address: &Address,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CatalogRepository {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products for the given ids in one lookup. Missing ids are skipped.
    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError>;

    async fn insert_category(&mut self, name: &str) -> Result<Category, RepositoryError>;

    async fn insert_product(
        &mut self,
        title: &str,
        price: Money,
        category_id: Option<CategoryId>,
        images: &[String],
    ) -> Result<Product, RepositoryError>;
}

#[async_trait]
pub trait CartRepository {
    async fn find_cart(&mut self, id: CartId) -> Result<Option<Cart>, RepositoryError>;

    async fn find_cart_for_product(
        &mut self,
        member_id: MemberId,
        product_id: ProductId,
    ) -> Result<Option<Cart>, RepositoryError>;

    async fn list_carts_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<Cart>, RepositoryError>;

    async fn insert_cart(&mut self, cart: NewCart) -> Result<Cart, RepositoryError>;

    async fn update_cart_quantity(&mut self, cart: &Cart) -> Result<(), RepositoryError>;

    /// Number of rows removed.
    async fn delete_cart(&mut self, id: CartId) -> Result<u64, RepositoryError>;

    /// Number of rows removed.
    async fn delete_carts_for_member(&mut self, member_id: MemberId)
    -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait CouponRepository {
    async fn find_coupon_definition(
        &mut self,
        id: CouponDefinitionId,
    ) -> Result<Option<CouponDefinition>, RepositoryError>;

    async fn insert_coupon_definition(
        &mut self,
        name: &str,
        discount: CouponDiscount,
    ) -> Result<CouponDefinition, RepositoryError>;

    async fn find_user_coupon(
        &mut self,
        id: UserCouponId,
    ) -> Result<Option<UserCoupon>, RepositoryError>;

    /// Coupons for the given ids in one lookup. Missing ids are skipped.
    async fn find_user_coupons(
        &mut self,
        ids: &[UserCouponId],
    ) -> Result<Vec<UserCoupon>, RepositoryError>;

    async fn list_unused_coupons_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<UserCoupon>, RepositoryError>;

    async fn insert_user_coupon(
        &mut self,
        coupon: NewUserCoupon,
    ) -> Result<UserCoupon, RepositoryError>;

    async fn update_user_coupon(&mut self, coupon: &UserCoupon) -> Result<(), RepositoryError>;

    /// Number of rows removed.
    async fn delete_user_coupon(&mut self, id: UserCouponId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository {
    /// Stores a new order at version 0 in state `PLACED`.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, RepositoryError>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Persist the order if its stored version still equals `order.version`.
    ///
    /// Returns the new version. A stale version yields
    /// `RepositoryError::Conflict` and writes nothing.
    async fn update_order(&mut self, order: &Order) -> Result<i64, RepositoryError>;

    /// Orders placed by the member, newest first.
    async fn list_orders_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Lines of all the given orders in one lookup.
    async fn list_order_lines(
        &mut self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLine>, RepositoryError>;
}
