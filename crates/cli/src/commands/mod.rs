//! Subcommand implementations.
//!
//! Every command reads `BAZAAR_DATABASE_URL` (falling back to
//! `DATABASE_URL`) and talks to `PostgreSQL` directly.

pub mod coupon;
pub mod member;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_api::db::RepositoryError;
use bazaar_api::services::ServiceError;
use bazaar_api::services::auth::AuthError;
use bazaar_core::coupon::CouponError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid coupon: {0}")]
    Coupon(#[from] CouponError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Connect to the database named by the environment.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("BAZAAR_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(bazaar_api::db::create_pool(&database_url).await?)
}
