//! Catalog route handlers. All public.

use axum::{
    Json,
    extract::State,
};

use bazaar_core::ProductId;
use bazaar_core::catalog::Category;

use crate::db::Database;
use crate::error::Result;
use crate::extract::PathParam;
use crate::services::catalog::{CatalogService, ProductView};
use crate::state::AppState;

pub async fn products<D: Database>(
    State(state): State<AppState<D>>,
) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(CatalogService::new(state.db()).list_products().await?))
}

pub async fn product<D: Database>(
    State(state): State<AppState<D>>,
    PathParam(id): PathParam<ProductId>,
) -> Result<Json<ProductView>> {
    Ok(Json(CatalogService::new(state.db()).get_product(id).await?))
}

pub async fn categories<D: Database>(
    State(state): State<AppState<D>>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(CatalogService::new(state.db()).list_categories().await?))
}
