//! Catalog reader.

use std::collections::HashMap;

use serde::Serialize;

use bazaar_core::catalog::{Category, Product};
use bazaar_core::{CategoryId, Money, ProductId};

use super::ServiceError;
use crate::db::{CatalogRepository, Database};

/// Category as shown next to a product. Products without a known category
/// carry an empty placeholder (`id: None`, blank name).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: Option<CategoryId>,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: Some(category.id),
            name: category.name.clone(),
        }
    }
}

/// Product display record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub category: CategoryView,
    pub images: Vec<String>,
}

impl ProductView {
    fn new(product: Product, category: Option<&Category>) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            category: category.map(CategoryView::from).unwrap_or_default(),
            images: product.images,
        }
    }
}

pub struct CatalogService<'a, D: Database> {
    db: &'a D,
}

impl<'a, D: Database> CatalogService<'a, D> {
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Every product joined with its category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    pub async fn list_products(&self) -> Result<Vec<ProductView>, ServiceError> {
        let mut uow = self.db.begin().await?;
        let products = uow.list_products().await?;
        let categories: HashMap<CategoryId, Category> = uow
            .list_categories()
            .await?
            .into_iter()
            .map(|category| (category.id, category))
            .collect();

        Ok(products
            .into_iter()
            .map(|product| {
                let category = product.category_id.and_then(|id| categories.get(&id));
                ProductView::new(product, category)
            })
            .collect())
    }

    /// One product with its category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    pub async fn get_product(&self, id: ProductId) -> Result<ProductView, ServiceError> {
        let mut uow = self.db.begin().await?;
        let product = uow
            .find_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))?;
        let category = match product.category_id {
            Some(category_id) => uow.find_category(category_id).await?,
            None => None,
        };

        Ok(ProductView::new(product, category.as_ref()))
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on store failure.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        let mut uow = self.db.begin().await?;
        Ok(uow.list_categories().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::UnitOfWork;
    use crate::db::memory::MemoryDatabase;

    #[tokio::test]
    async fn test_products_join_categories_with_placeholder() {
        let db = MemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();
        let mugs = uow.insert_category("Mugs").await.unwrap();
        uow.insert_product("Mug", Money::from_units(1000), Some(mugs.id), &[])
            .await
            .unwrap();
        uow.insert_product("Loose", Money::from_units(500), None, &[])
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let products = CatalogService::new(&db).list_products().await.unwrap();

        assert_eq!(products.len(), 2);
        let mug = products.iter().find(|p| p.title == "Mug").unwrap();
        assert_eq!(mug.category.name, "Mugs");
        let loose = products.iter().find(|p| p.title == "Loose").unwrap();
        assert_eq!(loose.category, CategoryView::default());
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let db = MemoryDatabase::new();

        let err = CatalogService::new(&db)
            .get_product(ProductId::new(42))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound { entity: "product", .. }));
    }

    #[test]
    fn test_placeholder_category_serializes_null_id() {
        let json = serde_json::to_value(CategoryView::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "id": null, "name": "" }));
    }
}
