//! Catalog seeding with sample products.

use blood_orange_core::Toman;
use blood_orange_store::db::{self, RepositoryError};
use blood_orange_store::models::product::NewProduct;

use super::connect;

/// Seed the catalog with a handful of sample products.
///
/// Products whose slug already exists are skipped, so reruns are harmless.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn catalog() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    let samples = [
        NewProduct {
            name: "Saffron 4.6g".to_owned(),
            description: "Negin saffron in a sealed tin.".to_owned(),
            unit_price: Toman::new(245_000),
            inventory: 40,
        },
        NewProduct {
            name: "Pistachios 500g".to_owned(),
            description: "Roasted and salted Akbari pistachios.".to_owned(),
            unit_price: Toman::new(310_000),
            inventory: 25,
        },
        NewProduct {
            name: "Dried Figs 250g".to_owned(),
            description: "Sun-dried estahban figs.".to_owned(),
            unit_price: Toman::new(95_000),
            inventory: 60,
        },
        NewProduct {
            name: "Rose Water 500ml".to_owned(),
            description: "Double-distilled Kashan rose water.".to_owned(),
            unit_price: Toman::new(58_000),
            inventory: 0,
        },
    ];

    for sample in &samples {
        match db::products::insert(&pool, sample).await {
            Ok(product) => tracing::info!(slug = %product.slug, "seeded product"),
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(name = %sample.name, "product already seeded, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Set a product's unit price.
///
/// Only future carts and orders see the new price; order item snapshots are
/// untouched.
///
/// # Errors
///
/// Returns an error for an unknown slug or a database failure.
pub async fn set_price(slug: &str, price: i64) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    let product = db::products::get_by_slug(&pool, slug)
        .await?
        .ok_or_else(|| format!("no product with slug {slug}"))?;

    db::products::update_price(&pool, product.id, Toman::new(price)).await?;
    tracing::info!(%slug, old = %product.unit_price, new = %Toman::new(price), "price updated");

    Ok(())
}
