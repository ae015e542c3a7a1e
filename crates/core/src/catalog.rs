//! Catalog records. Read-only from the cart and order side.

use serde::Serialize;

use crate::types::{CategoryId, Money, ProductId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub category_id: Option<CategoryId>,
    pub images: Vec<String>,
}

impl Product {
    /// First listed image, used as the thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}
