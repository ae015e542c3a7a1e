//! In-process backend.
//!
//! A unit of work holds the store lock for its whole lifetime and edits a
//! private copy of the data; `commit` swaps the copy in. Units of work are
//! therefore serialized, and one that is dropped leaves the store untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bazaar_core::cart::{Cart, NewCart};
use bazaar_core::catalog::{Category, Product};
use bazaar_core::coupon::{CouponDefinition, CouponDiscount, NewUserCoupon, UserCoupon};
use bazaar_core::member::{Member, NewMember};
use bazaar_core::order::{NewOrder, NewOrderLine, Order, OrderLine, OrderState};
use bazaar_core::{
    Address, CartId, CategoryId, CouponDefinitionId, MemberGrade, MemberId, Money, OrderId,
    OrderLineId, ProductId, UserCouponId,
};

use super::{
    CartRepository, CatalogRepository, CouponRepository, Database, MemberRepository,
    OrderRepository, RepositoryError, UnitOfWork,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i32,
    members: BTreeMap<MemberId, (Member, String)>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, Cart>,
    coupon_definitions: BTreeMap<CouponDefinitionId, CouponDefinition>,
    user_coupons: BTreeMap<UserCouponId, UserCoupon>,
    orders: BTreeMap<OrderId, Order>,
    order_lines: BTreeMap<OrderLineId, OrderLine>,
}

impl MemoryState {
    /// Shared across tables.
    const fn allocate(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process [`Database`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a member's grade. Grades have no HTTP surface; this stands in
    /// for the back office. Returns `false` if the member does not exist.
    pub async fn set_member_grade(&self, id: MemberId, grade: MemberGrade) -> bool {
        let mut state = self.state.lock().await;
        state
            .members
            .get_mut(&id)
            .map(|(member, _)| member.grade = grade)
            .is_some()
    }

    /// Change a product's catalog price. Returns `false` if the product does
    /// not exist.
    pub async fn set_product_price(&self, id: ProductId, price: Money) -> bool {
        let mut state = self.state.lock().await;
        state
            .products
            .get_mut(&id)
            .map(|product| product.price = price)
            .is_some()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnitOfWork { guard, working })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Exclusive access to the store plus the pending copy.
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(mut self) -> Result<(), RepositoryError> {
        *self.guard = self.working;
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for MemoryUnitOfWork {
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        Ok(self.working.members.get(&id).map(|(m, _)| m.clone()))
    }

    async fn find_member_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Member>, RepositoryError> {
        Ok(self
            .find_member_credentials(username)
            .await?
            .map(|(member, _)| member))
    }

    async fn find_member_credentials(
        &mut self,
        username: &str,
    ) -> Result<Option<(Member, String)>, RepositoryError> {
        Ok(self
            .working
            .members
            .values()
            .find(|(m, _)| m.username.as_str() == username)
            .cloned())
    }

    async fn insert_member(&mut self, member: NewMember) -> Result<Member, RepositoryError> {
        if self
            .working
            .members
            .values()
            .any(|(m, _)| m.username == member.username)
        {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let stored = Member {
            id: MemberId::new(self.working.allocate()),
            username: member.username,
            name: member.name,
            address: member.address,
            grade: MemberGrade::default(),
        };
        self.working
            .members
            .insert(stored.id, (stored.clone(), member.password_hash));
        Ok(stored)
    }

    async fn update_member_address(
        &mut self,
        id: MemberId,
        address: &Address,
    ) -> Result<(), RepositoryError> {
        let (member, _) = self
            .working
            .members
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        member.change_address(address.clone());
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryUnitOfWork {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .working
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.working.products.values().cloned().collect())
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.working.categories.values().cloned().collect())
    }

    async fn insert_category(&mut self, name: &str) -> Result<Category, RepositoryError> {
        if self.working.categories.values().any(|c| c.name == name) {
            return Err(RepositoryError::Conflict("category already exists".to_owned()));
        }
        let category = Category {
            id: CategoryId::new(self.working.allocate()),
            name: name.to_owned(),
        };
        self.working.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn insert_product(
        &mut self,
        title: &str,
        price: Money,
        category_id: Option<CategoryId>,
        images: &[String],
    ) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId::new(self.working.allocate()),
            title: title.to_owned(),
            price,
            category_id,
            images: images.to_vec(),
        };
        self.working.products.insert(product.id, product.clone());
        Ok(product)
    }
}

#[async_trait]
impl CartRepository for MemoryUnitOfWork {
    async fn find_cart(&mut self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.working.carts.get(&id).cloned())
    }

    async fn find_cart_for_product(
        &mut self,
        member_id: MemberId,
        product_id: ProductId,
    ) -> Result<Option<Cart>, RepositoryError> {
        Ok(self
            .working
            .carts
            .values()
            .find(|c| c.member_id == member_id && c.product_id == product_id)
            .cloned())
    }

    async fn list_carts_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<Cart>, RepositoryError> {
        Ok(self
            .working
            .carts
            .values()
            .filter(|c| c.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn insert_cart(&mut self, cart: NewCart) -> Result<Cart, RepositoryError> {
        let id = CartId::new(self.working.allocate());
        let stored = Cart::from_parts(id, cart.member_id, cart.product_id, i64::from(cart.quantity))
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        self.working.carts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_cart_quantity(&mut self, cart: &Cart) -> Result<(), RepositoryError> {
        let stored = self
            .working
            .carts
            .get_mut(&cart.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = cart.clone();
        Ok(())
    }

    async fn delete_cart(&mut self, id: CartId) -> Result<u64, RepositoryError> {
        Ok(u64::from(self.working.carts.remove(&id).is_some()))
    }

    async fn delete_carts_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<u64, RepositoryError> {
        let before = self.working.carts.len();
        self.working.carts.retain(|_, c| c.member_id != member_id);
        Ok(u64::try_from(before - self.working.carts.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl CouponRepository for MemoryUnitOfWork {
    async fn find_coupon_definition(
        &mut self,
        id: CouponDefinitionId,
    ) -> Result<Option<CouponDefinition>, RepositoryError> {
        Ok(self.working.coupon_definitions.get(&id).cloned())
    }

    async fn insert_coupon_definition(
        &mut self,
        name: &str,
        discount: CouponDiscount,
    ) -> Result<CouponDefinition, RepositoryError> {
        if self.working.coupon_definitions.values().any(|d| d.name == name) {
            return Err(RepositoryError::Conflict(
                "coupon definition already exists".to_owned(),
            ));
        }
        let definition = CouponDefinition {
            id: CouponDefinitionId::new(self.working.allocate()),
            name: name.to_owned(),
            discount,
        };
        self.working
            .coupon_definitions
            .insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn find_user_coupon(
        &mut self,
        id: UserCouponId,
    ) -> Result<Option<UserCoupon>, RepositoryError> {
        Ok(self.working.user_coupons.get(&id).cloned())
    }

    async fn find_user_coupons(
        &mut self,
        ids: &[UserCouponId],
    ) -> Result<Vec<UserCoupon>, RepositoryError> {
        Ok(self
            .working
            .user_coupons
            .values()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn list_unused_coupons_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<UserCoupon>, RepositoryError> {
        Ok(self
            .working
            .user_coupons
            .values()
            .filter(|c| c.member_id == member_id && !c.used)
            .cloned()
            .collect())
    }

    async fn insert_user_coupon(
        &mut self,
        coupon: NewUserCoupon,
    ) -> Result<UserCoupon, RepositoryError> {
        let stored = UserCoupon {
            id: UserCouponId::new(self.working.allocate()),
            member_id: coupon.member_id,
            definition_id: coupon.definition_id,
            name: coupon.name,
            used: false,
            discount: coupon.discount,
        };
        self.working.user_coupons.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_user_coupon(&mut self, coupon: &UserCoupon) -> Result<(), RepositoryError> {
        let stored = self
            .working
            .user_coupons
            .get_mut(&coupon.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = coupon.clone();
        Ok(())
    }

    async fn delete_user_coupon(&mut self, id: UserCouponId) -> Result<u64, RepositoryError> {
        Ok(u64::from(self.working.user_coupons.remove(&id).is_some()))
    }
}

#[async_trait]
impl OrderRepository for MemoryUnitOfWork {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order, RepositoryError> {
        let stored = Order {
            id: OrderId::new(self.working.allocate()),
            version: 0,
            orderer: order.orderer,
            shipping_info: order.shipping_info,
            message: order.message,
            state: OrderState::Placed,
            payment_info: order.payment_info,
            created_at: Utc::now(),
        };
        self.working.orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let mut stored = Vec::with_capacity(lines.len());
        for line in lines {
            let row = OrderLine {
                id: OrderLineId::new(self.working.allocate()),
                order_id,
                product_id: line.product_id,
                price: line.price,
                quantity: line.quantity,
                amounts: line.amount(),
            };
            self.working.order_lines.insert(row.id, row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn update_order(&mut self, order: &Order) -> Result<i64, RepositoryError> {
        let stored = self
            .working
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != order.version {
            return Err(RepositoryError::Conflict(format!(
                "order {} is no longer at version {}",
                order.id, order.version
            )));
        }
        *stored = Order {
            version: order.version + 1,
            ..order.clone()
        };
        Ok(stored.version)
    }

    async fn list_orders_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .working
            .orders
            .values()
            .rev()
            .filter(|o| o.orderer.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn list_order_lines(
        &mut self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .working
            .order_lines
            .values()
            .filter(|l| order_ids.contains(&l.order_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_work_is_discarded() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        uow.insert_category("Tea").await.unwrap();
        drop(uow);

        let mut uow = db.begin().await.unwrap();
        assert!(uow.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_committed_work_is_visible() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        uow.insert_category("Tea").await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_category_conflicts() {
        let db = MemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();
        uow.insert_category("Tea").await.unwrap();
        assert!(matches!(
            uow.insert_category("Tea").await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
