//! Persistence for the shop.
//!
//! Every service operation runs inside one [`UnitOfWork`] obtained from a
//! [`Database`]. Work is made durable by [`UnitOfWork::commit`]; dropping a
//! unit of work without committing discards it.
//!
//! Two backends exist:
//!
//! - [`postgres::PgDatabase`] - one `PostgreSQL` transaction per unit of work
//! - [`memory::MemoryDatabase`] - in-process store, selected with a `memory:`
//!   database URL and used by the test suites
//!
//! ## Tables
//!
//! - `members` - Accounts, addresses and grades
//! - `categories`, `products` - Catalog
//! - `carts` - One row per (member, product)
//! - `coupon_definitions`, `user_coupons` - Coupon templates and issued coupons
//! - `orders`, `order_lines` - Order headers and their priced lines
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
mod repository;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use repository::{
    CartRepository, CatalogRepository, CouponRepository, MemberRepository, OrderRepository,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (unique username) or a stale order version.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A transactional scope exposing every repository.
#[async_trait]
pub trait UnitOfWork:
    MemberRepository + CatalogRepository + CartRepository + CouponRepository + OrderRepository + Send
{
    /// Make every write performed through this unit of work durable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the commit fails.
    async fn commit(self) -> Result<(), RepositoryError>;
}

/// Source of units of work.
#[async_trait]
pub trait Database: Clone + Send + Sync + 'static {
    type Uow: UnitOfWork;

    /// Open a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if no transaction can be started.
    async fn begin(&self) -> Result<Self::Uow, RepositoryError>;

    /// Check the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store does not answer.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
