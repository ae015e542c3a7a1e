//! Seed the database with demo data.
//!
//! Creates a small catalog, two coupon definitions and a demo member. Each
//! group is skipped when rows of that kind already exist, so running the
//! command twice is harmless.

use bazaar_api::db::{
    CatalogRepository, CouponRepository, Database, MemberRepository, UnitOfWork,
    postgres::PgDatabase,
};
use bazaar_api::services::auth::hash_password;
use bazaar_core::coupon::CouponDiscount;
use bazaar_core::member::NewMember;
use bazaar_core::{Address, Money, Username};
use rust_decimal::Decimal;

use super::{CommandError, connect};

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo-password";

/// `(category, [(title, price, image)])`
const CATALOG: &[(&str, &[(&str, i64, &str)])] = &[
    (
        "Stationery",
        &[
            ("Dot grid notebook", 1_000, "/images/notebook.jpg"),
            ("Gel pen, black", 300, "/images/pen.jpg"),
        ],
    ),
    (
        "Kitchen",
        &[
            ("Enamel mug", 4_500, "/images/mug.jpg"),
            ("Pour-over kettle", 32_000, "/images/kettle.jpg"),
        ],
    ),
];

/// Seed every group.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let db = PgDatabase::new(connect().await?);
    let mut uow = db.begin().await?;

    seed_catalog(&mut uow).await?;
    seed_coupon_definitions(&mut uow).await?;
    seed_member(&mut uow).await?;

    uow.commit().await?;
    tracing::info!("Seeding complete!");
    Ok(())
}

async fn seed_catalog<U: UnitOfWork>(uow: &mut U) -> Result<(), CommandError> {
    if !uow.list_categories().await?.is_empty() {
        tracing::info!("Catalog already present, skipping");
        return Ok(());
    }

    for (category_name, products) in CATALOG {
        let category = uow.insert_category(category_name).await?;
        for (title, price, image) in *products {
            uow.insert_product(
                title,
                Money::from_units(*price),
                Some(category.id),
                &[(*image).to_string()],
            )
            .await?;
        }
        tracing::info!(category = %category.name, products = products.len(), "Seeded category");
    }
    Ok(())
}

async fn seed_coupon_definitions<U: UnitOfWork>(uow: &mut U) -> Result<(), CommandError> {
    // Definitions cannot be listed, so probe the first id.
    if uow
        .find_coupon_definition(bazaar_core::CouponDefinitionId::new(1))
        .await?
        .is_some()
    {
        tracing::info!("Coupon definitions already present, skipping");
        return Ok(());
    }

    let welcome = uow
        .insert_coupon_definition("Welcome 10%", CouponDiscount::Ratio(Decimal::from(10)))
        .await?;
    let flat = uow
        .insert_coupon_definition("1000 off", CouponDiscount::Fixed(Money::from_units(1_000)))
        .await?;
    tracing::info!(welcome = %welcome.id, flat = %flat.id, "Seeded coupon definitions");
    Ok(())
}

async fn seed_member<U: UnitOfWork>(uow: &mut U) -> Result<(), CommandError> {
    if uow.find_member_by_username(DEMO_USERNAME).await?.is_some() {
        tracing::info!(username = DEMO_USERNAME, "Demo member already present, skipping");
        return Ok(());
    }

    let username = Username::parse(DEMO_USERNAME)
        .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    let member = uow
        .insert_member(NewMember {
            username,
            name: "Demo Shopper".to_string(),
            address: Some(Address {
                zip_code: "04524".to_string(),
                address1: "1 Market Street".to_string(),
                address2: String::new(),
            }),
            password_hash: hash_password(DEMO_PASSWORD)?,
        })
        .await?;

    tracing::info!(id = %member.id, username = DEMO_USERNAME, "Seeded demo member");
    Ok(())
}
