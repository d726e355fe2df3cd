//! Database operations for products.
//!
//! The inventory columns are only ever written while holding the row lock
//! taken by [`lock`]; the catalog service owns that transaction.

use sqlx::{PgConnection, PgExecutor};

use blood_orange_core::{ProductId, Slug, Toman};

use super::RepositoryError;
use crate::models::product::{NewProduct, Product, StockState};

const PRODUCT_COLUMNS: &str =
    "id, name, slug, description, unit_price, inventory, activation, created_at, updated_at";

/// Get a product by its slug.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_slug(
    executor: impl PgExecutor<'_>,
    slug: &str,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Get a product by its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// List purchasable products, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_active(executor: impl PgExecutor<'_>) -> Result<Vec<Product>, RepositoryError> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE activation ORDER BY created_at DESC"
    ))
    .fetch_all(executor)
    .await?;

    Ok(products)
}

/// Lock a product row for a read-modify-write of its stock state.
///
/// Must run inside the transaction that will call [`update_stock`].
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Write back a stock state computed under the row lock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails and
/// `RepositoryError::NotFound` if the row vanished.
pub async fn update_stock(
    conn: &mut PgConnection,
    id: ProductId,
    state: StockState,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE product SET inventory = $2, activation = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(state.inventory)
    .bind(state.activation)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Insert a new product. The slug is derived from the name.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the slug is already taken.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    new: &NewProduct,
) -> Result<Product, RepositoryError> {
    let slug = Slug::from_name(&new.name);
    let activation = new.inventory > 0;

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO product (name, slug, description, unit_price, inventory, activation)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&new.name)
    .bind(&slug)
    .bind(&new.description)
    .bind(new.unit_price)
    .bind(new.inventory)
    .bind(activation)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(format!("product slug already exists: {slug}"));
        }
        RepositoryError::Database(e)
    })?;

    Ok(product)
}

/// Update a product's price (management path).
///
/// Order item snapshots are untouched by design; only future carts see the
/// new price.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product does not exist.
pub async fn update_price(
    executor: impl PgExecutor<'_>,
    id: ProductId,
    unit_price: Toman,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE product SET unit_price = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(unit_price)
            .execute(executor)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
