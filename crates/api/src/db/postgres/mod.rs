//! `PostgreSQL` backend.
//!
//! Queries are plain runtime `sqlx::query_as` calls mapped through `FromRow`
//! row structs, then converted into core types. Conversion failures surface as
//! `RepositoryError::DataCorruption`.

mod carts;
mod catalog;
mod coupons;
mod members;
mod orders;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{Database, RepositoryError, UnitOfWork};

/// Pool-backed [`Database`].
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Uow = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, RepositoryError> {
        Ok(PgUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One open transaction. Rolled back on drop unless committed.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Convert a stored `INTEGER` quantity into a line quantity.
fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("non-positive quantity in database: {quantity}"))
        })
}

/// Convert a line quantity into its `INTEGER` column value.
fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("quantity {quantity} does not fit the column"))
    })
}
