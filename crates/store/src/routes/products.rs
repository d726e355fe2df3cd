//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use blood_orange_core::{Slug, Toman};

use crate::error::{AppError, Result};
use crate::models::product::Product;
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub unit_price: Toman,
    pub price_display: String,
    pub inventory: i32,
    pub active: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            slug: product.slug,
            description: product.description,
            unit_price: product.unit_price,
            price_display: product.unit_price.to_string(),
            inventory: product.inventory,
            active: product.activation,
        }
    }
}

/// List purchasable products, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = state.catalog().list_active().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Product detail by slug (served from the catalog cache when warm).
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state
        .catalog()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no product: {slug}")))?;

    Ok(Json(ProductView::from(product)))
}
