//! Order queries.
//!
//! Every update is conditional on the version the order was read at and bumps
//! it, so a concurrent writer loses with `RepositoryError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use bazaar_core::order::{NewOrder, NewOrderLine, Order, OrderLine, OrderState, PaymentInfo};
use bazaar_core::{
    Address, MemberId, Money, OrderId, OrderLineId, Orderer, ProductId, Receiver, ShippingInfo,
};

use super::{PgUnitOfWork, quantity_from_db, quantity_to_db};
use crate::db::{OrderRepository, RepositoryError};

const ORDER_COLUMNS: &str = "id, version, member_id, orderer_name, receiver_name, receiver_phone, \
     zip_code, address1, address2, message, state, subtotal, grade_discount, coupon_discount, \
     payable, payment_method, created_at";

#[derive(FromRow)]
struct OrderRow {
    id: OrderId,
    version: i64,
    member_id: MemberId,
    orderer_name: String,
    receiver_name: String,
    receiver_phone: String,
    zip_code: String,
    address1: String,
    address2: String,
    message: Option<String>,
    state: OrderState,
    subtotal: Money,
    grade_discount: Money,
    coupon_discount: Money,
    payable: Money,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            version: row.version,
            orderer: Orderer {
                member_id: row.member_id,
                name: row.orderer_name,
            },
            shipping_info: ShippingInfo {
                receiver: Receiver {
                    name: row.receiver_name,
                    phone: row.receiver_phone,
                },
                address: Address {
                    zip_code: row.zip_code,
                    address1: row.address1,
                    address2: row.address2,
                },
            },
            message: row.message,
            state: row.state,
            payment_info: PaymentInfo {
                subtotal: row.subtotal,
                grade_discount: row.grade_discount,
                coupon_discount: row.coupon_discount,
                payable: row.payable,
                method: row.payment_method,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    product_id: ProductId,
    price: Money,
    quantity: i32,
    amounts: Money,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            price: row.price,
            quantity: quantity_from_db(row.quantity)?,
            amounts: row.amounts,
        })
    }
}

#[async_trait]
impl OrderRepository for PgUnitOfWork {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order, RepositoryError> {
        let NewOrder {
            orderer,
            shipping_info: ShippingInfo { receiver, address },
            message,
            payment_info,
        } = order;

        let sql = format!(
            "INSERT INTO orders (member_id, orderer_name, receiver_name, receiver_phone, \
                 zip_code, address1, address2, message, subtotal, grade_discount, \
                 coupon_discount, payable, payment_method) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(orderer.member_id)
            .bind(orderer.name)
            .bind(receiver.name)
            .bind(receiver.phone)
            .bind(address.zip_code)
            .bind(address.address1)
            .bind(address.address2)
            .bind(message)
            .bind(payment_info.subtotal)
            .bind(payment_info.grade_discount)
            .bind(payment_info.coupon_discount)
            .bind(payment_info.payable)
            .bind(payment_info.method)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(row.into())
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let mut stored = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, OrderLineRow>(
                "INSERT INTO order_lines (order_id, product_id, price, quantity, amounts) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, order_id, product_id, price, quantity, amounts",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.price)
            .bind(quantity_to_db(line.quantity)?)
            .bind(line.amount())
            .fetch_one(&mut *self.tx)
            .await?;
            stored.push(OrderLine::try_from(row)?);
        }
        Ok(stored)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Order::from))
    }

    async fn update_order(&mut self, order: &Order) -> Result<i64, RepositoryError> {
        let info = &order.shipping_info;
        let version: Option<i64> = sqlx::query_scalar(
            "UPDATE orders \
             SET version = version + 1, state = $3, receiver_name = $4, receiver_phone = $5, \
                 zip_code = $6, address1 = $7, address2 = $8, message = $9 \
             WHERE id = $1 AND version = $2 \
             RETURNING version",
        )
        .bind(order.id)
        .bind(order.version)
        .bind(order.state)
        .bind(&info.receiver.name)
        .bind(&info.receiver.phone)
        .bind(&info.address.zip_code)
        .bind(&info.address.address1)
        .bind(&info.address.address2)
        .bind(&order.message)
        .fetch_optional(&mut *self.tx)
        .await?;

        version.ok_or_else(|| {
            RepositoryError::Conflict(format!(
                "order {} is no longer at version {}",
                order.id, order.version
            ))
        })
    }

    async fn list_orders_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE member_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(member_id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn list_order_lines(
        &mut self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        sqlx::query_as::<_, OrderLineRow>(
            "SELECT id, order_id, product_id, price, quantity, amounts \
             FROM order_lines WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(OrderLine::try_from)
        .collect()
    }
}
