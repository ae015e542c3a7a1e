//! Catalog queries.

use async_trait::async_trait;
use sqlx::FromRow;

use bazaar_core::catalog::{Category, Product};
use bazaar_core::{CategoryId, Money, ProductId};

use super::PgUnitOfWork;
use crate::db::{CatalogRepository, RepositoryError, conflict_on_unique};

#[derive(FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    price: Money,
    category_id: Option<CategoryId>,
    images: Vec<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            price: row.price,
            category_id: row.category_id,
            images: row.images,
        }
    }
}

#[derive(FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[async_trait]
impl CatalogRepository for PgUnitOfWork {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, category_id, images FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, category_id, images FROM products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, category_id, images FROM products ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Category::from))
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn insert_category(&mut self, name: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;

        Ok(row.into())
    }

    async fn insert_product(
        &mut self,
        title: &str,
        price: Money,
        category_id: Option<CategoryId>,
        images: &[String],
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (title, price, category_id, images) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, price, category_id, images",
        )
        .bind(title)
        .bind(price)
        .bind(category_id)
        .bind(images)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }
}
